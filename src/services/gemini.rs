use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::PlanError;
use crate::models::{PlanRequest, PlanSource, RawPlanResponse};

use super::ai_service::PlanService;

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

/// Google Gemini `generateContent` client. One call per plan, no retries.
pub struct GeminiService {
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PlanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlanError::ProviderUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> PlanError {
        if e.is_timeout() {
            log::warn!("⏱️ Gemini request timed out after {:?}", self.timeout);
            PlanError::ProviderTimeout(self.timeout)
        } else {
            log::error!("❌ Gemini transport error: {}", e);
            PlanError::ProviderUnavailable(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl PlanService for GeminiService {
    async fn generate(&self, request: &PlanRequest) -> Result<RawPlanResponse, PlanError> {
        let payload = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 4096,
            },
        };

        log::info!("🤖 Sending plan request to Gemini with model: {}", self.model);
        log::debug!("📤 Prompt size: {} bytes", request.prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Gemini API error ({}): {}", status, error_text);
            return Err(PlanError::ProviderUnavailable(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        log::debug!("📄 Raw Gemini response size: {} bytes", response_text.len());

        let body: Value = serde_json::from_str(&response_text)
            .map_err(|e| PlanError::ProviderUnavailable(format!("undecodable Gemini response: {}", e)))?;

        let text = extract_text(&body)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PlanError::ProviderUnavailable("Gemini response contained no text".to_string()))?;

        log::info!("✅ Received plan text from Gemini ({} chars)", text.len());

        Ok(RawPlanResponse {
            body: text,
            source: PlanSource::Live,
        })
    }
}

/// Pulls the generated text out of the response shapes text APIs commonly use.
fn extract_text(body: &Value) -> Option<String> {
    if let Some(candidate) = body.get("candidates").and_then(|c| c.get(0)) {
        if let Some(parts) = candidate.pointer("/content/parts").and_then(Value::as_array) {
            let joined: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("");
            return Some(joined);
        }
        return candidate
            .get("content")
            .and_then(Value::as_str)
            .or_else(|| candidate.get("text").and_then(Value::as_str))
            .or_else(|| candidate.as_str())
            .map(str::to_string);
    }

    for key in ["text", "output"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }

    if let Some(choice) = body.get("choices").and_then(|c| c.get(0)) {
        return choice
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| choice.pointer("/message/content").and_then(Value::as_str))
            .or_else(|| choice.get("content").and_then(Value::as_str))
            .map(str::to_string);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Diet, Goal, Sex, UserProfile, DEFAULT_CUISINE};
    use crate::services::{metrics, prompt};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plan_request() -> PlanRequest {
        let profile = UserProfile {
            height_cm: 175.0,
            weight_kg: 70.0,
            age: 25,
            sex: Sex::Male,
            activity: ActivityLevel::Moderate,
            goal: Goal::Maintain,
            diet: Diet::Omnivore,
            cuisine: DEFAULT_CUISINE.to_string(),
        };
        prompt::build_prompt(&metrics::compute(&profile), &profile)
    }

    fn service(url: String, timeout: Duration) -> GeminiService {
        GeminiService::new("test_key".to_string(), url, "gemini-test".to_string(), timeout).unwrap()
    }

    #[test]
    fn test_extract_text_shapes() {
        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "Day 1"}, {"text": ": rice"}]}}]});
        assert_eq!(extract_text(&gemini).as_deref(), Some("Day 1: rice"));

        let plain = json!({"text": "hello"});
        assert_eq!(extract_text(&plain).as_deref(), Some("hello"));

        let output = json!({"output": "plan"});
        assert_eq!(extract_text(&output).as_deref(), Some("plan"));

        let chat = json!({"choices": [{"message": {"content": "chat plan"}}]});
        assert_eq!(extract_text(&chat).as_deref(), Some("chat plan"));

        assert_eq!(extract_text(&json!({"usage": 12})), None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let svc = service("https://example.test/v1beta/".to_string(), Duration::from_secs(1));
        assert_eq!(svc.endpoint(), "https://example.test/v1beta/models/gemini-test:generateContent");
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "## MEAL PLAN\nDay 1: pho | rice | fruit | fish"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let raw = service(server.uri(), Duration::from_secs(5))
            .generate(&plan_request())
            .await
            .unwrap();

        assert_eq!(raw.source, PlanSource::Live);
        assert!(raw.body.starts_with("## MEAL PLAN"));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = service(server.uri(), Duration::from_secs(5))
            .generate(&plan_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::ProviderUnavailable(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_empty_text_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = service(server.uri(), Duration::from_secs(5))
            .generate(&plan_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "late"}))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(100);
        let err = service(server.uri(), timeout)
            .generate(&plan_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::ProviderTimeout(t) if t == timeout));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let err = service("http://127.0.0.1:9".to_string(), Duration::from_secs(2))
            .generate(&plan_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::ProviderUnavailable(_)));
    }
}
