//! Chat prompt assembly.
//!
//! Builds prompts in the TinyLlama/Zephyr chat format: a system turn carrying
//! the retrieved collective context, the user turn, then an open assistant
//! turn for the model to complete.

/// Header line that introduces retrieved documents inside the system turn.
const CONTEXT_HEADER: &str = "CONTEXT FROM COLLECTIVE MEMORY:";

/// Assemble the full chat prompt.
///
/// When `context_docs` is empty the context block is omitted entirely and the
/// model answers from its own weights.
pub fn build_prompt(system_prompt: &str, context_docs: &[String], user_message: &str) -> String {
    let context_block = if context_docs.is_empty() {
        String::new()
    } else {
        let bullets: Vec<String> = context_docs.iter().map(|doc| format!("- {doc}")).collect();
        format!("\n{CONTEXT_HEADER}\n{}\n", bullets.join("\n"))
    };

    format!(
        "<|system|>\n{system_prompt}\n{context_block}</s>\n<|user|>\n{user_message}</s>\n<|assistant|>\n"
    )
}
