// Embedding Engine - local multilingual sentence embeddings via Candle
use crate::errors::{AssistantError, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Multilingual model; the corpus and user questions are Polish
pub const MODEL_ID: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
const EMBEDDING_DIM: usize = 384;

/// Opaque text-to-vector encoder
///
/// The knowledge store and the retriever must share one instance so corpus
/// and query vectors live in the same space.
pub trait Embedder: Send + Sync {
    /// Encode several texts, one vector per text, same order
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Vector length produced by this encoder
    fn dimension(&self) -> usize;

    /// Encode a single text
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text])?
            .pop()
            .ok_or_else(|| AssistantError::EmbeddingError("empty batch result".to_string()))
    }
}

fn embed_err(e: candle_core::Error) -> AssistantError {
    AssistantError::EmbeddingError(e.to_string())
}

/// Embedding engine using a BERT sentence-transformer via Candle
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
}

impl EmbeddingEngine {
    /// Create new embedding engine (downloads model on first use)
    pub fn new() -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| {
            AssistantError::EmbeddingError(format!("failed to create HuggingFace API client: {}", e))
        })?;
        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        let fetch = |name: &str| {
            repo.get(name).map_err(|e| {
                AssistantError::EmbeddingError(format!("failed to download {}: {}", name, e))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            AssistantError::EmbeddingError(format!("failed to load tokenizer: {}", e))
        })?;

        // SAFETY: the weights file is owned by the hf-hub cache and not mutated while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], candle_core::DType::F32, &device)
                .map_err(embed_err)?
        };

        let model = BertModel::load(vb, &config).map_err(embed_err)?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
        })
    }

    fn forward(&self, ids: Vec<Vec<u32>>, masks: Vec<Vec<u32>>) -> candle_core::Result<Vec<Vec<f32>>> {
        let batch_size = ids.len();
        let max_len = ids.iter().map(|v| v.len()).max().unwrap_or(0);

        // Pad sequences
        let mut padded_ids = vec![vec![0u32; max_len]; batch_size];
        let mut padded_mask = vec![vec![0u32; max_len]; batch_size];
        for (i, (ids, mask)) in ids.iter().zip(masks.iter()).enumerate() {
            padded_ids[i][..ids.len()].copy_from_slice(ids);
            padded_mask[i][..mask.len()].copy_from_slice(mask);
        }

        let flat_ids: Vec<u32> = padded_ids.into_iter().flatten().collect();
        let flat_mask: Vec<u32> = padded_mask.into_iter().flatten().collect();

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        Self::mean_pool(&hidden, &attention_mask)?.to_vec2::<f32>()
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        sum_embeddings.broadcast_div(&sum_mask)
    }
}

impl Embedder for EmbeddingEngine {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| AssistantError::EmbeddingError(format!("tokenization failed: {}", e)))?;

        let ids = encodings.iter().map(|e| e.get_ids().to_vec()).collect();
        let masks = encodings
            .iter()
            .map(|e| e.get_attention_mask().to_vec())
            .collect();

        self.forward(ids, masks).map_err(embed_err)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}
