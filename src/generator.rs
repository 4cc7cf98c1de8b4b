use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;

/// Remote text generation: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, RelayError>;
}

pub struct GeminiGenerator {
  client: reqwest::Client,
  api_base: String,
  model: String,
  api_key: String,
}

impl GeminiGenerator {
  pub fn new(api_base: &str, model: &str, api_key: String, timeout: Duration) -> Result<Self, RelayError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_string(),
      model: model.trim_start_matches("models/").to_string(),
      api_key,
    })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.api_base, self.model)
  }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}

#[derive(serde::Serialize)]
struct Content {
  role: String,
  parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
  text: String,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
  content: ResponseContent,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
  #[serde(default)]
  text: String,
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, RelayError> {
    let payload = GenerateRequest {
      contents: vec![Content {
        role: "user".to_string(),
        parts: vec![Part {
          text: prompt.to_string(),
        }],
      }],
    };

    let resp = self
      .client
      .post(self.endpoint())
      .query(&[("key", self.api_key.as_str())])
      .json(&payload)
      .send()
      .await
      .map_err(|err| RelayError::Generation(format!("Gemini request failed: {}", err.without_url())))?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(RelayError::Generation(format!("Gemini error ({status}): {body}")));
    }

    let body: GenerateResponse = resp
      .json()
      .await
      .map_err(|err| RelayError::Generation(format!("Failed to parse Gemini response: {}", err.without_url())))?;

    body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .map(|p| p.text)
      .ok_or_else(|| RelayError::Generation("No text in Gemini response".to_string()))
  }
}
