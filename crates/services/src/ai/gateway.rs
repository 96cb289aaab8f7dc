use std::time::Duration;

use prep_core::model::QuestionDraft;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompts;
use crate::error::AiError;

/// Upper bound on `numberOfQuestions` for one generation call.
pub const MAX_QUESTIONS_PER_REQUEST: u32 = 25;

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl AiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1";
    pub const DEFAULT_MODEL: &'static str = "meta-llama/llama-3-8b-instruct";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Config with default provider, model and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
            temperature: 0.2,
        }
    }
}

/// Validated parameters for a question-generation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRequest {
    role: String,
    experience: String,
    topics: Vec<String>,
    count: u32,
}

impl QuestionRequest {
    /// # Errors
    ///
    /// Returns `AiError::InvalidRequest` for a blank role or experience, no
    /// usable topics, or a count outside `1..=MAX_QUESTIONS_PER_REQUEST`.
    pub fn new(
        role: impl Into<String>,
        experience: impl Into<String>,
        topics: Vec<String>,
        count: u32,
    ) -> Result<Self, AiError> {
        let role = role.into().trim().to_owned();
        let experience = experience.into().trim().to_owned();
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();

        if role.is_empty() || experience.is_empty() || topics.is_empty() {
            return Err(AiError::InvalidRequest("Missing required fields"));
        }
        if count == 0 || count > MAX_QUESTIONS_PER_REQUEST {
            return Err(AiError::InvalidRequest(
                "numberOfQuestions must be between 1 and 25",
            ));
        }

        Ok(Self {
            role,
            experience,
            topics,
            count,
        })
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn experience(&self) -> &str {
        &self.experience
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: String,
}

impl From<GeneratedQuestion> for QuestionDraft {
    fn from(generated: GeneratedQuestion) -> Self {
        QuestionDraft::new(generated.question, generated.answer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptExplanation {
    pub title: String,
    pub explanation: String,
}

/// Client for an OpenAI-compatible chat-completions provider.
///
/// Generated content is returned to the caller and never persisted here.
#[derive(Clone)]
pub struct AiGateway {
    client: Client,
    config: Option<AiConfig>,
}

impl AiGateway {
    /// # Errors
    ///
    /// Returns `AiError::Client` if the HTTP client cannot be built.
    pub fn new(config: Option<AiConfig>) -> Result<Self, AiError> {
        let timeout = config
            .as_ref()
            .map_or(AiConfig::DEFAULT_TIMEOUT, |c| c.timeout);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate interview question/answer pairs.
    ///
    /// # Errors
    ///
    /// Returns `AiError::NotConfigured` when no API key is set, a provider
    /// error variant when the call fails, or `AiError::MalformedResponse`
    /// when the output is not a JSON array of question/answer objects.
    pub async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        let raw = self
            .complete(
                prompts::QUESTIONS_SYSTEM_PROMPT,
                prompts::question_answer_prompt(request),
            )
            .await?;
        let questions: Vec<GeneratedQuestion> = parse_content(raw)?;
        debug!(count = questions.len(), "generated interview questions");
        Ok(questions)
    }

    /// Explain the concept behind an interview question.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidRequest` for a blank question, otherwise the
    /// same failures as [`AiGateway::generate_questions`].
    pub async fn explain_concept(&self, question: &str) -> Result<ConceptExplanation, AiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AiError::InvalidRequest("Missing required fields"));
        }

        let raw = self
            .complete(
                prompts::EXPLANATION_SYSTEM_PROMPT,
                prompts::concept_explain_prompt(question),
            )
            .await?;
        let explanation: ConceptExplanation = parse_content(raw)?;
        debug!(title = %explanation.title, "generated concept explanation");
        Ok(explanation)
    }

    async fn complete(&self, system: &str, prompt: String) -> Result<String, AiError> {
        let config = self.config.as_ref().ok_or(AiError::NotConfigured)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: config.temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(send_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(send_failure)?;

        if !status.is_success() {
            let err = classify_status(status, body);
            warn!(status = %status, error = %err, "AI provider returned an error");
            return Err(err);
        }

        let envelope: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "AI provider response is not a chat completion");
            AiError::MalformedResponse {
                raw: body.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

fn send_failure(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        warn!("AI provider timed out");
        AiError::Timeout
    } else {
        warn!(error = %e, "AI provider unreachable");
        AiError::Transport(e.to_string())
    }
}

fn classify_status(status: StatusCode, payload: String) -> AiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AiError::QuotaExceeded { payload },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiError::Auth { status },
        _ => AiError::Upstream { status, payload },
    }
}

/// Strict parse: the whole content must be the JSON value, nothing else.
fn parse_content<T: DeserializeOwned>(raw: String) -> Result<T, AiError> {
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(error = %e, "AI output failed to parse");
            Err(AiError::MalformedResponse {
                raw,
                reason: e.to_string(),
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation_rejects_missing_fields_and_bad_counts() {
        assert!(QuestionRequest::new(" ", "junior", vec!["Go".into()], 5).is_err());
        assert!(QuestionRequest::new("Dev", "", vec!["Go".into()], 5).is_err());
        assert!(QuestionRequest::new("Dev", "junior", vec![" ".into()], 5).is_err());
        assert!(QuestionRequest::new("Dev", "junior", vec!["Go".into()], 0).is_err());
        assert!(
            QuestionRequest::new("Dev", "junior", vec!["Go".into()], MAX_QUESTIONS_PER_REQUEST + 1)
                .is_err()
        );

        let ok = QuestionRequest::new(" Dev ", "junior", vec![" Go ".into(), "".into()], 25).unwrap();
        assert_eq!(ok.role(), "Dev");
        assert_eq!(ok.topics(), ["Go".to_string()]);
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            AiError::QuotaExceeded { payload } if payload == "slow down"
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            AiError::Auth { status } if status == StatusCode::FORBIDDEN
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "oops".into()),
            AiError::Upstream { status, .. } if status == StatusCode::BAD_GATEWAY
        ));
    }

    #[test]
    fn parse_is_strict_about_shape() {
        let ok: Vec<GeneratedQuestion> =
            parse_content(r#"[{"question":"Q","answer":"A"}]"#.into()).unwrap();
        assert_eq!(ok[0].question, "Q");

        let fenced = "```json\n[{\"question\":\"Q\",\"answer\":\"A\"}]\n```".to_string();
        let err = parse_content::<Vec<GeneratedQuestion>>(fenced.clone()).unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse { raw, .. } if raw == fenced));

        assert!(parse_content::<ConceptExplanation>(String::new()).is_err());
        assert!(parse_content::<ConceptExplanation>(r#"{"title":"T"}"#.into()).is_err());
    }

    #[tokio::test]
    async fn unconfigured_gateway_refuses_calls() {
        let gateway = AiGateway::new(None).unwrap();
        assert!(!gateway.enabled());
        let request = QuestionRequest::new("Dev", "junior", vec!["Go".into()], 1).unwrap();
        assert!(matches!(
            gateway.generate_questions(&request).await.unwrap_err(),
            AiError::NotConfigured
        ));
        assert!(matches!(
            gateway.explain_concept("  ").await.unwrap_err(),
            AiError::InvalidRequest(_)
        ));
    }
}
