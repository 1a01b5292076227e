use anyhow::Result;
use futures::future::BoxFuture;
use log::{error, info};
use reqwest::Client;
use serde_json::Value;

/// Boundary to the external generation service: one operation, a prompt plus
/// the required output schema in, raw response text out. The gateway treats
/// implementations as opaque, possibly slow and possibly failing.
pub trait GenerateService: Send + Sync {
    fn generate(&self, prompt: String, schema: Value) -> BoxFuture<'_, Result<String>>;
}

/// Google generative-language client used in production. Requests structured
/// output via `responseMimeType`/`responseSchema`, so the model is contracted
/// to return JSON matching the shape the caller declared.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key,
            model,
        }
    }

    async fn generate_content(&self, prompt: &str, schema: &Value) -> Result<String> {
        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [ { "text": prompt } ]
                }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": 0.7
            }
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        info!("Sending generation request to Gemini model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, error_text);
            return Err(anyhow::anyhow!("Gemini API error {}: {}", status, error_text));
        }

        let body: Value = response.json().await?;
        let text = body
            .get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .ok_or_else(|| anyhow::anyhow!("No candidate text in Gemini response"))?;

        info!("Received {} characters from Gemini", text.len());
        Ok(text.trim().to_string())
    }
}

impl GenerateService for GeminiClient {
    fn generate(&self, prompt: String, schema: Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move { self.generate_content(&prompt, &schema).await })
    }
}
