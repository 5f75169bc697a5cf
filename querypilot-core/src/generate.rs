//! SQL generation stage: turns a natural-language question into a candidate
//! SELECT statement via a hosted chat-completions endpoint.
//!
//! The pipeline only depends on the [`SqlGenerator`] trait, so tests swap
//! in a canned generator and never touch the network. The production
//! implementation speaks the OpenAI-compatible chat-completions protocol.
//!
//! # Security
//! The admin credential is never part of the prompt or the request payload.
//! The generator sees the question and the schema snapshot, nothing else.

use async_trait::async_trait;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{QueryPilotError, Result};
use crate::models::SchemaSnapshot;

const SYSTEM_PROMPT: &str = "You are an expert in translating natural language \
questions into precise SQL SELECT queries. You always refer to the provided \
database schema to ensure correct table and column names. Only generate SELECT \
statements. Respond with the SQL statement and nothing else.";

/// Seam between the pipeline and whatever produces SQL from a question.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Produces a candidate SQL statement for the question, grounded in the
    /// schema snapshot.
    ///
    /// # Errors
    /// Returns [`QueryPilotError::Generation`] if no usable statement can
    /// be produced.
    async fn generate(&self, question: &str, schema: &SchemaSnapshot) -> Result<String>;
}

/// Production generator speaking the OpenAI-compatible chat-completions
/// protocol against the configured endpoint.
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatCompletionsGenerator {
    /// Creates a generator with its own HTTP client.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_payload(&self, question: &str, schema_json: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Database schema (tables, columns, types):\n{schema_json}\n\n\
                         Generate a SQL SELECT query for the following request: '{question}'"
                    ),
                },
            ],
            "temperature": 0.0,
        })
    }
}

#[async_trait]
impl SqlGenerator for ChatCompletionsGenerator {
    async fn generate(&self, question: &str, schema: &SchemaSnapshot) -> Result<String> {
        let schema_json = schema.to_json()?;
        let payload = self.build_payload(question, &schema_json);

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| QueryPilotError::generation_failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QueryPilotError::generation_failed(format!(
                "HTTP {status}: {}",
                truncate(&body, 300)
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryPilotError::generation_failed(format!("JSON parse error: {e}")))?;

        let text = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        if text.trim().is_empty() {
            return Err(QueryPilotError::generation_failed(
                "completion contained no usable text",
            ));
        }

        let sql = extract_sql(&text);
        debug!(model = %self.config.model, sql_len = sql.len(), "candidate statement generated");
        Ok(sql)
    }
}

/// Extracts the bare SQL statement from a completion.
///
/// Completions may wrap the statement in a markdown code fence or decorate
/// it with `SQLQuery:` / `SQLResult:` / `Answer:` markers; everything but
/// the statement itself is stripped.
pub fn extract_sql(response: &str) -> String {
    let mut text = response.trim();

    if let Some(fenced) = text.strip_prefix("```sql").or_else(|| text.strip_prefix("```")) {
        text = fenced.split("```").next().unwrap_or(fenced).trim();
    }

    let after_marker = match text.find("SQLQuery:") {
        Some(start) => &text[start + "SQLQuery:".len()..],
        None => text,
    };

    let end = after_marker
        .find("SQLResult:")
        .or_else(|| after_marker.find("Answer:"))
        .unwrap_or(after_marker.len());

    after_marker[..end].trim().to_string()
}

/// Truncates on a character boundary so error output stays bounded.
fn truncate(body: &str, max_bytes: usize) -> &str {
    if body.len() <= max_bytes {
        return body;
    }
    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_plain_statement() {
        assert_eq!(
            extract_sql("SELECT * FROM users"),
            "SELECT * FROM users"
        );
        assert_eq!(
            extract_sql("  SELECT id FROM users\n"),
            "SELECT id FROM users"
        );
    }

    #[test]
    fn test_extract_sql_strips_code_fence() {
        assert_eq!(
            extract_sql("```sql\nSELECT id FROM users\n```"),
            "SELECT id FROM users"
        );
        assert_eq!(
            extract_sql("```\nSELECT id FROM users\n```"),
            "SELECT id FROM users"
        );
    }

    #[test]
    fn test_extract_sql_strips_markers() {
        assert_eq!(
            extract_sql("SQLQuery: SELECT name FROM users SQLResult: [('ada',)]"),
            "SELECT name FROM users"
        );
        assert_eq!(
            extract_sql("SELECT name FROM users\nAnswer: there is one user"),
            "SELECT name FROM users"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "ééééé";
        let cut = truncate(body, 3);
        assert!(cut.len() <= 3);
        assert!(body.starts_with(cut));
        assert_eq!(truncate("short", 300), "short");
    }

    #[test]
    fn test_payload_never_contains_credential_material() {
        let generator = ChatCompletionsGenerator::new(LlmConfig::new("sk-key".to_string()));
        let payload = generator.build_payload("list users", "{\"users\": {}}");

        let rendered = payload.to_string();
        assert!(!rendered.contains("sk-key"));
        assert!(rendered.contains("list users"));
        assert!(rendered.contains("users"));
        assert_eq!(payload["temperature"], serde_json::json!(0.0));
    }
}
