//! In-process sentence encoder (BERT via candle), e.g. `all-MiniLM-L6-v2`.
//!
//! Output matches sentence-transformers: attention-masked mean pooling followed by
//! L2 normalization. Inference runs on the blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::matching::embedder::{Embedder, EmbedderError, Embedding};

struct EncoderInner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

#[derive(Clone)]
pub struct LocalCandleEmbedder {
    inner: Arc<EncoderInner>,
}

impl LocalCandleEmbedder {
    /// Downloads (or reuses the cached) model files from the Hugging Face hub and loads them.
    pub fn new(model_id: &str) -> Result<Self, EmbedderError> {
        let device = Device::Cpu;

        tracing::info!(model = model_id, "Initializing local Candle embedding model");

        let api = Api::new().map_err(|e| EmbedderError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("config.json: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer.json: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model.safetensors: {e}")))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("read config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_contents)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("parse config: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer: {e}")))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("truncation config: {e}")))?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| EmbedderError::ModelLoadFailed(format!("weights: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model: {e}")))?;

        tracing::info!("Local Candle embedding model loaded successfully");

        Ok(Self {
            inner: Arc::new(EncoderInner {
                model,
                tokenizer,
                device,
            }),
        })
    }
}

impl EncoderInner {
    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization: {e}")))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut all_input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut all_type_ids = Vec::with_capacity(texts.len() * max_len);
        let mut all_attention_mask = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let pad_len = max_len - ids.len();

            all_input_ids.extend_from_slice(ids);
            all_input_ids.extend(std::iter::repeat(0u32).take(pad_len));

            all_type_ids.extend_from_slice(encoding.get_type_ids());
            all_type_ids.extend(std::iter::repeat(0u32).take(pad_len));

            all_attention_mask.extend_from_slice(encoding.get_attention_mask());
            all_attention_mask.extend(std::iter::repeat(0u32).take(pad_len));
        }

        let batch_size = texts.len();
        let infer = |e: candle_core::Error| EmbedderError::InferenceFailed(e.to_string());

        let input_ids =
            Tensor::from_vec(all_input_ids, (batch_size, max_len), &self.device).map_err(infer)?;
        let token_type_ids =
            Tensor::from_vec(all_type_ids, (batch_size, max_len), &self.device).map_err(infer)?;
        let attention_mask = Tensor::from_vec(all_attention_mask, (batch_size, max_len), &self.device)
            .map_err(infer)?;

        let embeddings = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .and_then(|t| t.to_dtype(DType::F32))
            .map_err(infer)?;

        // Mean pooling with attention mask
        let mask = attention_mask.to_dtype(DType::F32).map_err(infer)?;
        let summed = embeddings
            .broadcast_mul(&mask.unsqueeze(2).map_err(infer)?)
            .and_then(|t| t.sum(1))
            .map_err(infer)?;
        let token_counts = mask.sum(1).and_then(|t| t.unsqueeze(1)).map_err(infer)?;
        let pooled = summed.broadcast_div(&token_counts).map_err(infer)?;

        let mut results = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut values: Vec<f32> = pooled.get(i).and_then(|t| t.to_vec1()).map_err(infer)?;
            l2_normalize(&mut values);
            results.push(values);
        }

        Ok(results)
    }
}

fn l2_normalize(v: &mut [f32]) {
    let length: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if length > 0.0 {
        v.iter_mut().for_each(|x| *x /= length);
    }
}

#[async_trait]
impl Embedder for LocalCandleEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || inner.encode_texts(&texts))
            .await
            .map_err(|e| EmbedderError::InferenceFailed(format!("encoder task failed: {e}")))??;
        Ok(vectors.into_iter().map(Embedding::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    #[ignore = "downloads sentence-transformers/all-MiniLM-L6-v2 from the hub"]
    fn test_loads_minilm_and_embeds_384_dimensions() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let embedder = LocalCandleEmbedder::new("sentence-transformers/all-MiniLM-L6-v2")
            .expect("Failed to load model");
        let embeddings = runtime
            .block_on(embedder.embed_batch(&["rust backend engineer".to_string()]))
            .expect("Failed to embed");
        assert_eq!(embeddings[0].values.len(), 384);
    }
}
