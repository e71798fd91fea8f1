use super::*;
use std::time::Duration;

/// HTTP backend that turns sketches into one combined image
pub struct CombineBackend {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CombineRequest<'a> {
    drawings: Vec<&'a str>,
    prompt_clues: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CombineResponse {
    image: String,
}

impl CombineBackend {
    pub fn new(url: String) -> AiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AiError::ConfigError(e.to_string()))?;
        Ok(Self { url, client })
    }

    pub async fn combine(&self, sketches: &[Sketch]) -> AiResult<String> {
        let body = CombineRequest {
            drawings: sketches.iter().map(|s| s.image.as_str()).collect(),
            prompt_clues: sketches.iter().map(Sketch::describe).collect(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::ApiError(format!("Combine backend unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AiError::ApiError(format!(
                "Combine backend returned status {}",
                response.status()
            )));
        }

        let reply: CombineResponse = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(format!("Combine backend reply: {}", e)))?;

        if reply.image.trim().is_empty() {
            return Err(AiError::ParseError("Combine backend returned no image".to_string()));
        }
        Ok(reply.image)
    }
}
