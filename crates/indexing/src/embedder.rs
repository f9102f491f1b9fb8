use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use futures::stream::{self, StreamExt, TryStreamExt};
use mdl_index_common::{Document, EmbeddingConfig, EmbeddingProvider, IndexError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Text embedding provider
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings from an Ollama server's `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(url: &str, model: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Embedding(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension,
        })
    }
}

async fn from_response<T>(resp: reqwest::Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let status_code = resp.status();
    if !status_code.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(IndexError::Embedding(format!("error code: {}, {}", status_code, body)));
    }

    resp.json()
        .await
        .map_err(|e| IndexError::Embedding(format!("invalid embedding response: {}", e)))
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };
        let resp = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Embedding(format!("request to {} failed: {}", self.url, e)))?;

        let response: OllamaEmbedResponse = from_response(resp).await?;
        check_count(texts.len(), response.embeddings)
    }
}

/// Local ONNX embeddings through fastembed
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load `model_code` (e.g. `Qdrant/all-MiniLM-L6-v2-onnx`); unknown codes fall back to
    /// all-MiniLM-L6-v2.
    pub async fn new(model_code: &str) -> Result<Self> {
        let supported = TextEmbedding::list_supported_models();
        let (model, dimension, model_name) = match supported
            .iter()
            .find(|info| info.model_code.eq_ignore_ascii_case(model_code))
        {
            Some(info) => (info.model.clone(), info.dim, info.model_code.clone()),
            None => {
                debug!("Unknown fastembed model '{}', using all-MiniLM-L6-v2", model_code);
                (EmbeddingModel::AllMiniLML6V2, 384, "all-MiniLM-L6-v2".to_string())
            }
        };

        info!("Loading fastembed model: {}", model_name);
        let embedding = tokio::task::spawn_blocking(move || TextEmbedding::try_new(InitOptions::new(model)))
            .await
            .map_err(|e| IndexError::Embedding(format!("model loading task failed: {}", e)))?
            .map_err(|e| IndexError::Embedding(format!("failed to load fastembed model: {}", e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name,
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let expected = texts.len();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| IndexError::Embedding("fastembed model lock poisoned".into()))?;
            model
                .embed(texts, None)
                .map_err(|e| IndexError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| IndexError::Embedding(format!("embedding task failed: {}", e)))??;

        check_count(expected, embeddings)
    }
}

fn check_count(expected: usize, embeddings: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    if embeddings.len() != expected {
        return Err(IndexError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            embeddings.len()
        )));
    }
    Ok(embeddings)
}

/// Build the provider selected in config
pub async fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            &config.url,
            &config.model,
            config.dimension as usize,
            Duration::from_secs(config.timeout_secs),
        )?)),
        EmbeddingProvider::FastEmbed => {
            let embedder = FastEmbedder::new(&config.model).await?;
            if embedder.dimension() as u64 != config.dimension {
                return Err(IndexError::Config(format!(
                    "model {} produces {}-dimensional vectors but embedding.dimension is {}",
                    embedder.name(),
                    embedder.dimension(),
                    config.dimension
                )));
            }
            Ok(Arc::new(embedder))
        }
    }
}

/// Attaches embeddings to documents, `batch_size` texts per request and at most
/// `concurrency` requests in flight.
#[derive(Clone)]
pub struct DocumentEmbedder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
}

impl DocumentEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize, concurrency: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub async fn embed_documents(&self, mut documents: Vec<Document>) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let batches: Vec<Vec<String>> = documents
            .chunks(self.batch_size)
            .map(|chunk| chunk.iter().map(|doc| doc.content.clone()).collect())
            .collect();
        info!(
            "Embedding {} documents in {} batches with {}",
            documents.len(),
            batches.len(),
            self.embedder.name()
        );

        let embeddings: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let vectors = embedder.embed(&batch).await?;
                    check_count(batch.len(), vectors)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        for (document, embedding) in documents.iter_mut().zip(embeddings.into_iter().flatten()) {
            document.embedding = Some(embedding);
        }
        Ok(documents)
    }
}
