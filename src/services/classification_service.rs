use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::clients::GeminiClient;
use crate::db::repositories::{MessageStore, MetricStore};
use crate::error::{AppError, AppResult};
use crate::models::NewMetric;

pub const MAX_MESSAGE_LEN: usize = 4000;

const SYSTEM_PROMPT: &str = "You classify customer messages received on messaging platforms. \
Reply with a single JSON object {\"category\": ..., \"sentiment\": ...}. \
category is one of support, sales, complaint, inquiry, feedback, spam, other. \
sentiment is one of positive, neutral, negative.";

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced json regex"));
static BARE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Support,
    Sales,
    Complaint,
    Inquiry,
    Feedback,
    Spam,
    #[default]
    Other,
}

impl Category {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "support" => Category::Support,
            "sales" => Category::Sales,
            "complaint" => Category::Complaint,
            "inquiry" => Category::Inquiry,
            "feedback" => Category::Feedback,
            "spam" => Category::Spam,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Support => "support",
            Category::Sales => "sales",
            Category::Complaint => "complaint",
            Category::Inquiry => "inquiry",
            Category::Feedback => "feedback",
            Category::Spam => "spam",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Value recorded for the `sentiment_score` metric.
    pub fn score(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Classification {
    pub category: Category,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub message: String,
    #[serde(default)]
    pub message_id: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Deserialize)]
struct RawClassification {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sentiment: Option<String>,
}

/// Pulls `{category, sentiment}` out of a model reply. Accepts a fenced
/// ```json block or the outermost bare object. Anything unreadable becomes
/// other/neutral.
pub fn parse_classification(reply: &str) -> Classification {
    let candidate = FENCED_JSON
        .captures(reply)
        .and_then(|c| c.get(1))
        .or_else(|| BARE_OBJECT.find(reply))
        .map(|m| m.as_str());

    let Some(candidate) = candidate else {
        warn!("Classification reply contained no JSON object");
        return Classification::default();
    };

    match serde_json::from_str::<RawClassification>(candidate) {
        Ok(raw) => Classification {
            category: raw.category.as_deref().map(Category::parse).unwrap_or_default(),
            sentiment: raw.sentiment.as_deref().map(Sentiment::parse).unwrap_or_default(),
        },
        Err(e) => {
            warn!("Classification reply was not valid JSON: {}", e);
            Classification::default()
        }
    }
}

pub struct ClassificationService {
    gemini: Arc<GeminiClient>,
    metrics: Arc<dyn MetricStore>,
    messages: Arc<dyn MessageStore>,
}

impl ClassificationService {
    pub fn new(gemini: Arc<GeminiClient>, metrics: Arc<dyn MetricStore>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            gemini,
            metrics,
            messages,
        }
    }

    pub async fn classify(&self, user_id: &Uuid, request: ClassifyRequest) -> AppResult<Classification> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::Validation(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }

        if let Some(message_id) = request.message_id {
            if !self.messages.exists_for_user(user_id, &message_id).await? {
                return Err(AppError::NotFound(format!("Message {} not found", message_id)));
            }
        }

        let reply = self.gemini.generate_text(SYSTEM_PROMPT, message).await?;
        let classification = parse_classification(&reply);

        let metrics = vec![
            NewMetric {
                metric_type: "message_classified".to_string(),
                value: 1.0,
                platform: request.platform.clone(),
                metadata: Some(json!({
                    "category": classification.category,
                    "sentiment": classification.sentiment,
                })),
            },
            NewMetric {
                metric_type: "sentiment_score".to_string(),
                value: classification.sentiment.score(),
                platform: request.platform,
                metadata: None,
            },
        ];
        self.metrics.insert_many(user_id, &metrics).await?;

        if let Some(message_id) = request.message_id {
            let updated = self
                .messages
                .update_classification(
                    user_id,
                    &message_id,
                    classification.category.as_str(),
                    classification.sentiment.as_str(),
                )
                .await?;
            if !updated {
                return Err(AppError::NotFound(format!("Message {} not found", message_id)));
            }
        }

        info!(
            "Classified message for user {} as {}/{}",
            user_id,
            classification.category.as_str(),
            classification.sentiment.as_str()
        );
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::GeminiConfig;
    use crate::services::test_support::{InMemoryMessageStore, InMemoryMetricStore};
    use pretty_assertions::assert_eq;

    fn gemini_reply(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    fn service_for(
        server: &mockito::ServerGuard,
        metrics: Arc<InMemoryMetricStore>,
        messages: Arc<InMemoryMessageStore>,
    ) -> ClassificationService {
        let gemini = GeminiClient::new(&GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-test".to_string(),
            base_url: server.url(),
        })
        .unwrap();
        ClassificationService::new(Arc::new(gemini), metrics, messages)
    }

    #[test]
    fn test_parse_fenced_block() {
        let reply = "Sure!\n```json\n{\"category\": \"Complaint\", \"sentiment\": \"negative\"}\n```";
        assert_eq!(
            parse_classification(reply),
            Classification {
                category: Category::Complaint,
                sentiment: Sentiment::Negative,
            }
        );
    }

    #[test]
    fn test_parse_bare_object_and_unknown_values() {
        let reply = "result: {\"category\": \"billing\", \"sentiment\": \"positive\"}";
        assert_eq!(
            parse_classification(reply),
            Classification {
                category: Category::Other,
                sentiment: Sentiment::Positive,
            }
        );
    }

    #[test]
    fn test_parse_garbage_falls_back() {
        assert_eq!(parse_classification("no idea"), Classification::default());
        assert_eq!(parse_classification("{not json}"), Classification::default());
    }

    #[tokio::test]
    async fn test_classify_updates_message_and_writes_metrics() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply(r#"{"category":"sales","sentiment":"positive"}"#))
            .create_async()
            .await;

        let user_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let metrics = Arc::new(InMemoryMetricStore::default());
        let messages = Arc::new(InMemoryMessageStore::default().with_message(user_id, message_id));
        let service = service_for(&server, metrics.clone(), messages.clone());

        let result = service
            .classify(
                &user_id,
                ClassifyRequest {
                    message: "Do you ship to Lisbon?".to_string(),
                    message_id: Some(message_id),
                    platform: Some("whatsapp".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(result.category, Category::Sales);
        assert_eq!(
            messages.classification(&message_id),
            Some(("sales".to_string(), "positive".to_string()))
        );

        let rows = metrics.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.metric_type, "message_classified");
        assert_eq!(rows[0].1.metadata, Some(json!({ "category": "sales", "sentiment": "positive" })));
        assert_eq!(rows[1].1.metric_type, "sentiment_score");
        assert_eq!(rows[1].1.value, 1.0);
    }

    #[tokio::test]
    async fn test_foreign_message_is_not_found_without_upstream_call() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(200)
            .with_body(gemini_reply(r#"{"category":"spam","sentiment":"neutral"}"#))
            .expect(0)
            .create_async()
            .await;

        let owner = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let metrics = Arc::new(InMemoryMetricStore::default());
        let messages = Arc::new(InMemoryMessageStore::default().with_message(owner, message_id));
        let service = service_for(&server, metrics.clone(), messages.clone());

        let result = service
            .classify(
                &Uuid::new_v4(),
                ClassifyRequest {
                    message: "win a prize".to_string(),
                    message_id: Some(message_id),
                    platform: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        upstream.assert_async().await;
        assert!(metrics.rows().is_empty());
        assert_eq!(messages.classification(&message_id), None);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_external() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let metrics = Arc::new(InMemoryMetricStore::default());
        let service = service_for(&server, metrics.clone(), Arc::new(InMemoryMessageStore::default()));

        let result = service
            .classify(
                &Uuid::new_v4(),
                ClassifyRequest {
                    message: "hello".to_string(),
                    message_id: None,
                    platform: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::External(_))));
        assert!(metrics.rows().is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_before_upstream_call() {
        let server = mockito::Server::new_async().await;
        let service = service_for(
            &server,
            Arc::new(InMemoryMetricStore::default()),
            Arc::new(InMemoryMessageStore::default()),
        );
        let result = service
            .classify(
                &Uuid::new_v4(),
                ClassifyRequest {
                    message: "   ".to_string(),
                    message_id: None,
                    platform: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
