//! T5 backend on candle
//!
//! Expects a model directory holding `tokenizer.json`, `config.json` and
//! `model.safetensors`.

use super::{GenerationOptions, Seq2SeqModel};
use crate::error::{ConsoleError, ConsoleResult};
use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config, T5ForConditionalGeneration};
use std::path::Path;
use tokenizers::Tokenizer;

pub struct T5Model {
    model: T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
    use_cache: bool,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl T5Model {
    pub fn load(model_dir: &str) -> Result<Self> {
        let dir = Path::new(model_dir);
        let tokenizer_path = dir.join("tokenizer.json");
        let config_path = dir.join("config.json");
        let weights_path = dir.join("model.safetensors");

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load {}: {}", tokenizer_path.display(), e))?;

        let config_text = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_text)
            .with_context(|| format!("invalid model config {}", config_path.display()))?;

        let device = select_device()?;
        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)
        }
        .with_context(|| format!("failed to map {}", weights_path.display()))?;
        let model = T5ForConditionalGeneration::load(vb, &config)
            .context("failed to build T5 model from weights")?;

        tracing::info!("loaded T5 model from {} on {:?}", model_dir, device);

        Ok(Self {
            model,
            tokenizer,
            device,
            use_cache: config.use_cache,
            decoder_start_token_id: config
                .decoder_start_token_id
                .unwrap_or(config.pad_token_id) as u32,
            eos_token_id: config.eos_token_id as u32,
        })
    }

    fn run(&mut self, prompt: &str, options: &GenerationOptions) -> ConsoleResult<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ConsoleError::Inference(e.to_string()))?;
        let input = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference)?;
        let encoder_output = self.model.encode(&input).map_err(inference)?;

        let mut output_ids = vec![self.decoder_start_token_id];
        while output_ids.len() < options.max_output_tokens {
            if options.deadline_passed() {
                return Err(ConsoleError::timeout("generation", options.timeout));
            }

            let step_ids: &[u32] = if output_ids.len() == 1 || !self.use_cache {
                &output_ids
            } else {
                &output_ids[output_ids.len() - 1..]
            };
            let decoder_input = Tensor::new(step_ids, &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(inference)?;
            let next = self
                .model
                .decode(&decoder_input, &encoder_output)
                .and_then(|logits| logits.squeeze(0))
                .and_then(|logits| logits.argmax(D::Minus1))
                .and_then(|id| id.to_scalar::<u32>())
                .map_err(inference)?;

            if next == self.eos_token_id {
                break;
            }
            output_ids.push(next);
        }

        self.tokenizer
            .decode(&output_ids, true)
            .map_err(|e| ConsoleError::Inference(e.to_string()))
    }
}

impl Seq2SeqModel for T5Model {
    fn generate(&mut self, prompt: &str, options: &GenerationOptions) -> ConsoleResult<String> {
        let result = self.run(prompt, options);
        self.model.clear_kv_cache();
        result
    }
}

fn inference(e: candle_core::Error) -> ConsoleError {
    ConsoleError::Inference(e.to_string())
}

/// CUDA, then Metal, then CPU
fn select_device() -> Result<Device> {
    if candle_core::utils::cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if candle_core::utils::metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        Ok(Device::Cpu)
    }
}
