//! Backend-independent decoding helpers: logit constraints and beam sampling.
//!
//! Everything here works on plain `f32` rows so it can be driven by any model
//! that produces next-token logits.

use std::cmp::Ordering;

use rand::Rng;

/// Temperature-scaled log-softmax of one logit row.
#[must_use]
pub fn log_softmax(logits: &[f32], temperature: f64) -> Vec<f32> {
    #[allow(clippy::cast_possible_truncation)]
    let t = temperature.max(1e-5) as f32;
    let scaled: Vec<f32> = logits.iter().map(|l| l / t).collect();
    let max = scaled
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = scaled.iter().map(|v| (v - max).exp()).sum();
    let log_sum = max + sum.ln();
    scaled.iter().map(|v| v - log_sum).collect()
}

/// Tokens that would complete an n-gram already present in `tokens`.
#[must_use]
pub fn banned_ngram_tokens(tokens: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || tokens.len() + 1 < n {
        return Vec::new();
    }
    let prefix = &tokens[tokens.len() + 1 - n..];
    tokens
        .windows(n)
        .filter(|w| &w[..n - 1] == prefix)
        .map(|w| w[n - 1])
        .collect()
}

/// Mask the end token below the minimum length and every token that would
/// repeat an n-gram. `generated` excludes the decoder start token.
pub fn apply_constraints(
    row: &mut [f32],
    generated: &[u32],
    min_new_tokens: usize,
    no_repeat_ngram_size: usize,
    eos_token_id: u32,
) {
    if generated.len() < min_new_tokens
        && let Some(v) = row.get_mut(eos_token_id as usize)
    {
        *v = f32::NEG_INFINITY;
    }
    for token in banned_ngram_tokens(generated, no_repeat_ngram_size) {
        if let Some(v) = row.get_mut(token as usize) {
            *v = f32::NEG_INFINITY;
        }
    }
}

#[derive(Debug, Clone)]
pub struct BeamParams {
    pub num_beams: usize,
    pub min_new_tokens: usize,
    pub max_new_tokens: usize,
    pub no_repeat_ngram_size: usize,
    pub temperature: f64,
    pub start_token_id: u32,
    pub eos_token_id: u32,
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

impl Beam {
    fn generated(&self) -> &[u32] {
        &self.tokens[1..]
    }

    #[allow(clippy::cast_precision_loss)]
    fn normalized_score(&self) -> f32 {
        self.score / self.generated().len().max(1) as f32
    }
}

/// Beam search where each step's continuations are sampled rather than taken greedily.
///
/// `step` receives the live sequences (all of equal length, each starting with
/// the decoder start token) and returns one logit row per sequence. Each step
/// draws `2 * num_beams` distinct (beam, token) candidates without replacement,
/// proportionally to the cumulative beam probability, and keeps the best
/// `num_beams` that do not end the sequence. Finished hypotheses are ranked by
/// length-normalized log-probability; search stops early once `num_beams` of
/// them exist. The winner is returned without start or end token.
///
/// # Errors
///
/// Propagates the first error returned by `step`.
pub fn beam_sample<R, E, F>(params: &BeamParams, rng: &mut R, mut step: F) -> Result<Vec<u32>, E>
where
    R: Rng + ?Sized,
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>, E>,
{
    let num_beams = params.num_beams.max(1);
    let mut live = vec![Beam {
        tokens: vec![params.start_token_id],
        score: 0.0,
    }];
    let mut finished: Vec<Beam> = Vec::new();

    for _ in 0..params.max_new_tokens {
        let sequences: Vec<Vec<u32>> = live.iter().map(|b| b.tokens.clone()).collect();
        let rows = step(&sequences)?;

        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (beam_idx, (beam, row)) in live.iter().zip(rows).enumerate() {
            let mut row = row;
            apply_constraints(
                &mut row,
                beam.generated(),
                params.min_new_tokens,
                params.no_repeat_ngram_size,
                params.eos_token_id,
            );
            for (token, lp) in log_softmax(&row, params.temperature).into_iter().enumerate() {
                if lp.is_finite() {
                    #[allow(clippy::cast_possible_truncation)]
                    candidates.push((beam.score + lp, beam_idx, token as u32));
                }
            }
        }
        if candidates.is_empty() {
            break;
        }

        let picks = sample_without_replacement(&candidates, 2 * num_beams, rng);
        let mut next = Vec::with_capacity(num_beams);
        for (score, beam_idx, token) in picks {
            let parent = &live[beam_idx];
            if token == params.eos_token_id {
                finished.push(Beam {
                    tokens: parent.tokens.clone(),
                    score,
                });
            } else {
                let mut tokens = parent.tokens.clone();
                tokens.push(token);
                next.push(Beam { tokens, score });
            }
            if next.len() == num_beams {
                break;
            }
        }

        if finished.len() >= num_beams || next.is_empty() {
            live = next;
            break;
        }
        live = next;
    }

    if finished.len() < num_beams {
        finished.extend(live);
    }
    let best = finished
        .into_iter()
        .max_by(|a, b| {
            a.normalized_score()
                .partial_cmp(&b.normalized_score())
                .unwrap_or(Ordering::Equal)
        })
        .map(|b| b.tokens[1..].to_vec())
        .unwrap_or_default();
    Ok(best)
}

/// Gumbel-top-k: draws `k` distinct candidates, each with probability
/// proportional to `exp(score)`, sorted by score descending.
fn sample_without_replacement<R: Rng + ?Sized>(
    candidates: &[(f32, usize, u32)],
    k: usize,
    rng: &mut R,
) -> Vec<(f32, usize, u32)> {
    let mut keyed: Vec<(f64, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(i, (score, _, _))| {
            let u: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
            (f64::from(*score) - (-u.ln()).ln(), i)
        })
        .collect();

    let k = k.min(keyed.len());
    if k < keyed.len() {
        keyed.select_nth_unstable_by(k, |a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        keyed.truncate(k);
    }

    let mut picked: Vec<(f32, usize, u32)> = keyed.iter().map(|&(_, i)| candidates[i]).collect();
    picked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    picked
}
