//! Next-token sampling over raw logits.
//!
//! Implements the standard decode-time sampling chain: temperature scaling,
//! top-k truncation, then top-p (nucleus) truncation. A temperature of zero
//! short-circuits to argmax.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decode-time sampling knobs.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    /// Softmax temperature. `0.0` selects the argmax token.
    pub temperature: f32,
    /// Keep only the k highest logits. `0` disables the filter.
    pub top_k: usize,
    /// Keep the smallest set of tokens whose cumulative probability reaches p.
    pub top_p: f32,
}

/// Stateful token sampler. Holds the RNG so repeated draws within one
/// generation share a stream.
pub struct Sampler {
    params: SamplingParams,
    rng: StdRng,
}

impl Sampler {
    pub fn new(params: SamplingParams) -> Self {
        Self {
            params,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded construction for reproducible tests.
    pub fn with_seed(params: SamplingParams, seed: u64) -> Self {
        Self {
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample a token index from a logits row.
    pub fn sample(&mut self, logits: &[f32]) -> usize {
        if logits.is_empty() {
            return 0;
        }
        if self.params.temperature <= 0.0 {
            return argmax(logits);
        }

        // Temperature-scaled candidates, sorted by logit descending
        let inv_temp = 1.0 / self.params.temperature;
        let mut candidates: Vec<(usize, f32)> = logits
            .iter()
            .enumerate()
            .map(|(i, &l)| (i, l * inv_temp))
            .collect();
        candidates
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if self.params.top_k > 0 && candidates.len() > self.params.top_k {
            candidates.truncate(self.params.top_k);
        }

        // Softmax over the surviving candidates (max-subtracted for stability)
        let max_logit = candidates[0].1;
        let mut probs: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|(i, l)| (i, (l - max_logit).exp()))
            .collect();
        let total: f32 = probs.iter().map(|(_, p)| p).sum();
        for (_, p) in &mut probs {
            *p /= total;
        }

        // Nucleus cut: keep the shortest prefix reaching top_p
        if self.params.top_p < 1.0 {
            let mut cumulative = 0.0f32;
            let mut keep = probs.len();
            for (rank, (_, p)) in probs.iter().enumerate() {
                cumulative += p;
                if cumulative >= self.params.top_p {
                    keep = rank + 1;
                    break;
                }
            }
            probs.truncate(keep);
        }

        // Draw within the retained probability mass
        let mass: f32 = probs.iter().map(|(_, p)| p).sum();
        let mut draw = self.rng.gen::<f32>() * mass;
        for (i, p) in &probs {
            draw -= p;
            if draw <= 0.0 {
                return *i;
            }
        }
        probs.last().map(|(i, _)| *i).unwrap_or(0)
    }
}

fn argmax(logits: &[f32]) -> usize {
    let mut best = 0;
    for (i, &l) in logits.iter().enumerate() {
        if l > logits[best] {
            best = i;
        }
    }
    best
}
