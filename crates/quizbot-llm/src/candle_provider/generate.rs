use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::t5::T5ForConditionalGeneration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokenizers::Tokenizer;

use crate::decode::{BeamParams, apply_constraints, beam_sample};
use crate::error::LlmError;
use crate::provider::{DecodingStrategy, GenerationConfig};

#[derive(Debug, Clone, Copy)]
pub struct SpecialTokens {
    /// End of sequence; also used as the pad token.
    pub eos: u32,
    pub decoder_start: u32,
}

pub struct GenerationOutput {
    pub text: String,
    pub tokens_generated: usize,
}

/// Run one prompt through the encoder, then decode with the strategy `config` selects.
///
/// The KV cache is cleared before and after, so an earlier failure cannot leak
/// state into this request.
///
/// # Errors
///
/// Returns an error if tokenization, a forward pass, or decoding fails.
pub fn generate_t5(
    model: &mut T5ForConditionalGeneration,
    tokenizer: &Tokenizer,
    prompt: &str,
    config: &GenerationConfig,
    special: SpecialTokens,
    device: &Device,
) -> Result<GenerationOutput, LlmError> {
    model.clear_kv_cache();

    let encoding = tokenizer
        .encode(prompt, true)
        .map_err(|e| LlmError::Inference(format!("tokenizer encode failed: {e}")))?;
    let mut input_ids = encoding.get_ids().to_vec();
    truncate_input(&mut input_ids, config.max_input_tokens, special.eos);

    let input = Tensor::new(input_ids.as_slice(), device)?.unsqueeze(0)?;
    let encoder_output = model.encode(&input)?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let tokens = match config.strategy() {
        DecodingStrategy::Nucleus => {
            nucleus_decode(model, &encoder_output, config, special, seed, device)?
        }
        DecodingStrategy::BeamSample => {
            beam_decode(model, &encoder_output, config, special, seed, device)?
        }
    };
    model.clear_kv_cache();

    let text = tokenizer
        .decode(&tokens, true)
        .map_err(|e| LlmError::Inference(format!("tokenizer decode failed: {e}")))?;
    Ok(GenerationOutput {
        text,
        tokens_generated: tokens.len(),
    })
}

/// Cut the encoded prompt to `max_input_tokens`, keeping the trailing end token.
pub fn truncate_input(ids: &mut Vec<u32>, max_input_tokens: usize, eos: u32) {
    let max = max_input_tokens.max(1);
    if ids.len() > max {
        ids.truncate(max - 1);
        ids.push(eos);
    }
}

fn sampling_for(config: &GenerationConfig) -> Sampling {
    let temperature = config.temperature;
    if temperature <= 0.0 {
        return Sampling::ArgMax;
    }
    match config.top_p {
        Some(p) => Sampling::TopP { p, temperature },
        None => Sampling::All { temperature },
    }
}

fn nucleus_decode(
    model: &mut T5ForConditionalGeneration,
    encoder_output: &Tensor,
    config: &GenerationConfig,
    special: SpecialTokens,
    seed: u64,
    device: &Device,
) -> Result<Vec<u32>, LlmError> {
    let mut processor = LogitsProcessor::from_sampling(seed, sampling_for(config));
    let constrained = config.min_output_tokens > 0 || config.no_repeat_ngram_size > 0;
    let mut output = vec![special.decoder_start];

    for index in 0..config.max_output_tokens {
        // with the KV cache warm only the newest token has to be fed
        let fed = if index == 0 {
            &output[..]
        } else {
            &output[output.len() - 1..]
        };
        let input = Tensor::new(fed, device)?.unsqueeze(0)?;
        let logits = model
            .decode(&input, encoder_output)?
            .squeeze(0)?
            .to_dtype(DType::F32)?;

        let logits = if constrained {
            let mut row = logits.to_vec1::<f32>()?;
            apply_constraints(
                &mut row,
                &output[1..],
                config.min_output_tokens,
                config.no_repeat_ngram_size,
                special.eos,
            );
            Tensor::new(row.as_slice(), device)?
        } else {
            logits
        };

        let next = processor.sample(&logits)?;
        if next == special.eos {
            break;
        }
        output.push(next);
    }

    Ok(output.split_off(1))
}

fn beam_decode(
    model: &mut T5ForConditionalGeneration,
    encoder_output: &Tensor,
    config: &GenerationConfig,
    special: SpecialTokens,
    seed: u64,
    device: &Device,
) -> Result<Vec<u32>, LlmError> {
    let params = BeamParams {
        num_beams: config.num_beams,
        min_new_tokens: config.min_output_tokens,
        max_new_tokens: config.max_output_tokens,
        no_repeat_ngram_size: config.no_repeat_ngram_size,
        temperature: config.temperature,
        start_token_id: special.decoder_start,
        eos_token_id: special.eos,
    };
    let mut rng = StdRng::seed_from_u64(seed);

    beam_sample(&params, &mut rng, |sequences| {
        // beams are re-decoded in full every step, the cache must start empty
        model.clear_kv_cache();
        let rows = sequences.len();
        let len = sequences.first().map_or(0, Vec::len);
        let input = Tensor::from_vec(sequences.concat(), (rows, len), device)?;
        let encoder_output = encoder_output.repeat((rows, 1, 1))?;
        let logits = model
            .decode(&input, &encoder_output)?
            .to_dtype(DType::F32)?;
        Ok(logits.to_vec2::<f32>()?)
    })
}
