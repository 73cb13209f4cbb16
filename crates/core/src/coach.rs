use crate::evaluation::{
    ParsedEvaluation, UnattributedText, parse_evaluation_with, parse_follow_up_questions,
};
use crate::prompts::{AnswerLength, PromptBook};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-latest";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection settings for the Messages API.
#[derive(Debug)]
pub struct CoachConfig {
    base_url: String,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
}

pub struct CoachConfigBuilder {
    config: CoachConfig,
}

impl CoachConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CoachConfig::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> CoachConfig {
        self.config
    }
}

impl Default for CoachConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(String::new()),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn builder() -> CoachConfigBuilder {
        CoachConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects values that are obviously not an API key, such as a short string
/// or a chunk of a pasted document.
pub fn is_plausible_api_key(key: &str) -> bool {
    const PASTE_MARKERS: [&str; 3] = ["🧱", "Functional Requirements", "MVP Scope"];
    key.chars().count() >= 20 && !PASTE_MARKERS.iter().any(|m| key.contains(m))
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Text of the first content block, the only one the prompts ask for.
    pub fn first_text(&self) -> Result<&str> {
        self.content
            .first()
            .map(|block| block.text.as_str())
            .ok_or_else(|| anyhow!("Empty response from API"))
    }
}

/// Everything the practice flow needs from the language model.
///
/// Implemented by [`CoachClient`] for the hosted API and by
/// [`crate::offline::OfflineCoach`] for canned replies; tests use the
/// generated `MockCoach`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Coach: Send + Sync {
    async fn generate_question(
        &self,
        difficulty: u8,
        category: &str,
        length: AnswerLength,
    ) -> Result<String>;

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        length: AnswerLength,
    ) -> Result<ParsedEvaluation>;

    async fn generate_follow_up_questions(&self, question: &str, answer: &str)
    -> Result<Vec<String>>;

    async fn improve_text(&self, text: &str, text_type: &str) -> Result<ParsedEvaluation>;

    async fn generate_random_fact(&self, category: &str) -> Result<String>;

    async fn generate_metacognitive_guidance(&self, input: &str) -> Result<String>;
}

pub struct CoachClient {
    client: Client,
    config: CoachConfig,
    prompts: PromptBook,
}

impl CoachClient {
    pub fn new(config: CoachConfig, prompts: PromptBook) -> Self {
        Self {
            client: Client::new(),
            config,
            prompts,
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Sends a single user message and returns the reply text.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model = %self.config.model, "Sending prompt ({} chars)", prompt.len());

        let resp = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Messages API")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Messages API returned {status}: {detail}"));
        }

        let resp = resp
            .json::<MessagesResponse>()
            .await
            .context("Failed to decode Messages API response")?;

        if let Some(usage) = &resp.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Received reply"
            );
        }

        Ok(resp.first_text()?.to_string())
    }
}

#[async_trait]
impl Coach for CoachClient {
    async fn generate_question(
        &self,
        difficulty: u8,
        category: &str,
        length: AnswerLength,
    ) -> Result<String> {
        let prompt = self.prompts.generate_question(difficulty, category, length);
        let question = self.complete(&prompt).await?;
        Ok(question.trim().to_string())
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        length: AnswerLength,
    ) -> Result<ParsedEvaluation> {
        let prompt = self.prompts.evaluate_answer(question, answer, length);
        let reply = self.complete(&prompt).await?;
        Ok(parse_evaluation_with(&reply, UnattributedText::Discard))
    }

    async fn generate_follow_up_questions(
        &self,
        question: &str,
        answer: &str,
    ) -> Result<Vec<String>> {
        let prompt = self.prompts.follow_up_questions(question, answer);
        let reply = self.complete(&prompt).await?;
        let questions = parse_follow_up_questions(&reply);
        if questions.is_empty() {
            tracing::warn!("No scored follow-up questions found in reply");
        }
        Ok(questions)
    }

    async fn improve_text(&self, text: &str, text_type: &str) -> Result<ParsedEvaluation> {
        let prompt = self.prompts.improve_text(text, text_type);
        let reply = self.complete(&prompt).await?;
        Ok(parse_evaluation_with(&reply, UnattributedText::Feedback))
    }

    async fn generate_random_fact(&self, category: &str) -> Result<String> {
        let prompt = self.prompts.random_fact(category);
        let fact = self.complete(&prompt).await?;
        Ok(fact.trim().to_string())
    }

    async fn generate_metacognitive_guidance(&self, input: &str) -> Result<String> {
        let prompt = self.prompts.metacognitive_guidance(input);
        let guidance = self.complete(&prompt).await?;
        Ok(guidance.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = CoachConfig::builder()
            .with_base_url("http://localhost:8080/")
            .with_api_key("sk-ant-test-key-0123456789")
            .with_model("claude-test")
            .with_max_tokens(256)
            .build();

        assert_eq!(config.messages_url(), "http://localhost:8080/v1/messages");
        assert_eq!(config.api_key().expose_secret(), "sk-ant-test-key-0123456789");
        assert_eq!(config.model(), "claude-test");
        assert_eq!(config.max_tokens(), 256);
    }

    #[test]
    fn test_default_config() {
        let config = CoachConfig::default();
        assert_eq!(config.messages_url(), "https://api.anthropic.com/v1/messages");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_api_key_plausibility() {
        assert!(is_plausible_api_key("sk-ant-REDACTED"));
        assert!(!is_plausible_api_key("short"));
        assert!(!is_plausible_api_key(
            "## Functional Requirements for the app, pasted by mistake"
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            messages: vec![RequestMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "max_tokens": 10,
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn test_response_first_text() {
        let raw = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "CLARITY SCORE: 9" }],
            "model": "claude",
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": { "input_tokens": 12, "output_tokens": 4 }
        }"#;
        let resp: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.first_text().unwrap(), "CLARITY SCORE: 9");
        assert_eq!(resp.usage.unwrap().output_tokens, 4);
    }

    #[test]
    fn test_response_without_content_is_an_error() {
        let resp: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        let err = resp.first_text().unwrap_err();
        assert_eq!(err.to_string(), "Empty response from API");
    }

    fn live_client() -> CoachClient {
        dotenvy::dotenv_override().ok();
        let api_key = env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY not set");
        let config = CoachConfig::builder().with_api_key(&api_key).build();
        CoachClient::new(config, PromptBook::default())
    }

    // Live call against the hosted API. Run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_evaluate_answer_live() {
        let coach = live_client();
        let evaluation = coach
            .evaluate_answer(
                "Should cities ban cars from their centers?",
                "Yes, because fewer cars means cleaner air, although deliveries and disabled access need exceptions.",
                AnswerLength::Short,
            )
            .await
            .expect("evaluate_answer failed");

        println!("Evaluation: {:?}", evaluation);
        for score in evaluation.scores() {
            assert!((1..=10).contains(&score), "Score out of range: {score}");
        }
        assert!(!evaluation.feedback.is_empty(), "Feedback should be present");
    }

    // See the note on `test_evaluate_answer_live`.
    #[tokio::test]
    #[ignore]
    async fn test_follow_up_questions_live() {
        let coach = live_client();
        let questions = coach
            .generate_follow_up_questions(
                "Is remote work better than office work?",
                "It depends on the kind of work and the person.",
            )
            .await
            .expect("generate_follow_up_questions failed");

        println!("Follow-ups: {:?}", questions);
        assert!(!questions.is_empty(), "Should return at least one question");
    }
}
