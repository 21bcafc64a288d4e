//! Text-classification over HTTP (Hugging Face inference API shape).
//!
//! Request:  `POST {endpoint}` with `{"inputs": "<text>"}`
//! Response: `[[{"label": "POSITIVE", "score": 0.99}, ...]]`, or the same
//! list without the outer nesting, or a single `{label, score}` object.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{ClassifyError, Classifier};
use crate::chunking::DEFAULT_MAX_CHUNK_CHARS;
use crate::model::{Classification, SentimentLabel};

pub const DEFAULT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub max_retries: usize,
    pub timeout: Duration,
    pub max_chars: usize,
}

impl RemoteConfig {
    pub fn for_model(model: &str) -> Self {
        Self {
            endpoint: format!("https://api-inference.huggingface.co/models/{model}"),
            token: None,
            max_retries: 3,
            timeout: Duration::from_secs(60),
            max_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::for_model(DEFAULT_MODEL)
    }
}

pub struct RemoteClassifier {
    client: Client,
    cfg: RemoteConfig,
}

impl RemoteClassifier {
    pub fn new(cfg: RemoteConfig) -> anyhow::Result<Self> {
        use anyhow::Context;
        // Each call runs on its own short-lived runtime, so pooled
        // connections would outlive the runtime that owns them.
        let client = Client::builder()
            .gzip(true)
            .connect_timeout(Duration::from_secs(15))
            .timeout(cfg.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .context("HTTP client build failed")?;
        Ok(Self { client, cfg })
    }

    async fn call_with_retries(&self, text: &str) -> Result<serde_json::Value, ClassifyError> {
        let body = json!({ "inputs": text });
        let max_retries = self.cfg.max_retries.max(1);
        let mut attempt = 0usize;
        let mut delay_ms = 750u64;

        loop {
            attempt += 1;
            let started = Instant::now();
            let mut req = self.client.post(&self.cfg.endpoint).json(&body);
            if let Some(token) = &self.cfg.token {
                req = req.bearer_auth(token);
            }

            let failure = match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    match resp.text().await {
                        Ok(payload) if status.is_success() => {
                            debug!("[classifier] {} in {}ms", status, started.elapsed().as_millis());
                            return serde_json::from_str(&payload)
                                .map_err(|e| ClassifyError::MalformedResponse(e.to_string()));
                        }
                        Ok(payload) => ClassifyError::Status { status: status.as_u16(), body: payload },
                        Err(e) => ClassifyError::Transport(format!("reading body: {e}")),
                    }
                }
                Err(e) => ClassifyError::Transport(e.to_string()),
            };

            warn!("⚠️ [classifier] attempt {attempt}/{max_retries} failed: {failure}");
            if attempt >= max_retries {
                return Err(failure);
            }
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms = (delay_ms as f64 * 1.75).min(5000.0) as u64;
        }
    }
}

impl Classifier for RemoteClassifier {
    fn name(&self) -> &str {
        &self.cfg.endpoint
    }

    fn max_input_chars(&self) -> usize {
        self.cfg.max_chars
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
        if text.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let len = text.chars().count();
        if len > self.cfg.max_chars {
            return Err(ClassifyError::InputTooLong { len, max: self.cfg.max_chars });
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClassifyError::Transport(format!("runtime: {e}")))?;
        let payload = rt.block_on(self.call_with_retries(text))?;
        parse_classification(&payload)
    }
}

#[derive(Debug, Deserialize)]
struct Scored {
    label: String,
    score: f32,
}

/// Pick the highest-scoring label out of an inference payload.
pub fn parse_classification(payload: &serde_json::Value) -> Result<Classification, ClassifyError> {
    if let Some(err) = payload.get("error").and_then(|e| e.as_str()) {
        return Err(ClassifyError::MalformedResponse(err.to_string()));
    }

    let candidates = match payload {
        serde_json::Value::Array(outer) => match outer.first() {
            Some(serde_json::Value::Array(inner)) => inner.clone(),
            _ => outer.clone(),
        },
        serde_json::Value::Object(_) => vec![payload.clone()],
        other => {
            return Err(ClassifyError::MalformedResponse(format!("unexpected payload: {other}")));
        }
    };

    let mut best: Option<Scored> = None;
    for c in candidates {
        let scored: Scored = serde_json::from_value(c)
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;
        if best.as_ref().map_or(true, |b| scored.score > b.score) {
            best = Some(scored);
        }
    }

    best.map(|b| Classification { label: SentimentLabel::from_raw(&b.label), confidence: b.score })
        .ok_or_else(|| ClassifyError::MalformedResponse("no labels in response".into()))
}
