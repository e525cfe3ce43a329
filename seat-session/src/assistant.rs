//! The external AI seating collaborator.
//!
//! The assistant is a chat-completions endpoint that returns seating plans
//! as JSON. It is strictly best-effort: any transport failure, bad status,
//! or unparseable body degrades to the deterministic local generator, so
//! the caller always gets some valid seating.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

use seat_core::{fallback_plan, parse_assistant_payload, PlanParseError, SeatingPlan, DEFAULT_TABLE_SIZE};

/// A request for seating suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingRequest {
    /// Guest names, one per line.
    pub guest_list: String,
    /// How many alternative plans to ask for.
    pub plan_count: usize,
}

/// Assistant errors. All of them are recoverable via the fallback.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The request never completed.
    #[error("assistant transport failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("assistant returned status {code}")]
    Status {
        /// The HTTP status code.
        code: u16,
    },

    /// The response body did not have the chat-completions shape.
    #[error("malformed assistant response: {0}")]
    MalformedResponse(String),

    /// The completion content was not a recognizable plan payload.
    #[error(transparent)]
    Plan(#[from] PlanParseError),
}

/// Where a set of plans came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    /// The external assistant produced the plans.
    Assistant,
    /// The deterministic local generator produced them.
    Fallback,
}

/// Generates seating plans for a guest list.
#[async_trait]
pub trait SeatingAssistant: Send + Sync {
    /// Produce candidate plans for the request.
    async fn generate(&self, request: &SeatingRequest) -> Result<Vec<SeatingPlan>, AssistantError>;
}

/// Chat-completions backed assistant.
pub struct HttpAssistant {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpAssistant {
    /// Create an assistant against a chat-completions endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: "deepseek-chat".to_owned(),
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn prompt(request: &SeatingRequest) -> String {
        format!(
            "You are SmartSeat, an event planning assistant. Produce {count} \
             seating arrangement(s) for the guest list below as strict JSON, \
             with no prose or code fences. Seat at most {size} guests per \
             table, grouping related names together. Respond with an array of \
             tables, each {{\"tableName\": string, \"guests\": [string]}}, or \
             an object {{\"plans\": [...]}} when producing alternatives.\n\
             Guest list, one name per line:\n---\n{list}\n---",
            count = request.plan_count.max(1),
            size = DEFAULT_TABLE_SIZE,
            list = request.guest_list,
        )
    }
}

#[async_trait]
impl SeatingAssistant for HttpAssistant {
    async fn generate(&self, request: &SeatingRequest) -> Result<Vec<SeatingPlan>, AssistantError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system",
                 "content": "You are SmartSeat, an event planning assistant. Output strict JSON only."},
                {"role": "user", "content": Self::prompt(request)},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status {
                code: status.as_u16(),
            });
        }

        let completion: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;
        let content = completion["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AssistantError::MalformedResponse("missing choices[0].message.content".to_owned())
            })?;
        let payload: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

        Ok(parse_assistant_payload(&payload)?)
    }
}

/// Ask the assistant for plans, degrading to the deterministic generator on
/// any failure or an empty answer.
pub async fn plans_or_fallback(
    assistant: &dyn SeatingAssistant,
    request: &SeatingRequest,
) -> (Vec<SeatingPlan>, PlanSource) {
    match assistant.generate(request).await {
        Ok(plans) if !plans.is_empty() => (plans, PlanSource::Assistant),
        Ok(_) => {
            warn!("assistant returned no plans, using fallback generator");
            (
                vec![fallback_plan(&request.guest_list, DEFAULT_TABLE_SIZE)],
                PlanSource::Fallback,
            )
        }
        Err(error) => {
            warn!(%error, "assistant failed, using fallback generator");
            (
                vec![fallback_plan(&request.guest_list, DEFAULT_TABLE_SIZE)],
                PlanSource::Fallback,
            )
        }
    }
}

/// Scripted assistant for tests. Queue plans or failures; each `generate`
/// consumes one queue entry.
#[derive(Debug, Default)]
pub struct MockAssistant {
    inner: Arc<Mutex<MockAssistantInner>>,
}

#[derive(Debug, Default)]
struct MockAssistantInner {
    responses: VecDeque<Result<Vec<SeatingPlan>, String>>,
    requests: Vec<SeatingRequest>,
}

impl MockAssistant {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer for the next `generate`.
    pub fn queue_plans(&self, plans: Vec<SeatingPlan>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.responses.push_back(Ok(plans));
        }
    }

    /// Queue a failure for the next `generate`.
    pub fn fail_next(&self, error: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.responses.push_back(Err(error.to_string()));
        }
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<SeatingRequest> {
        self.inner
            .lock()
            .map(|inner| inner.requests.clone())
            .unwrap_or_default()
    }
}

impl Clone for MockAssistant {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl SeatingAssistant for MockAssistant {
    async fn generate(&self, request: &SeatingRequest) -> Result<Vec<SeatingPlan>, AssistantError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AssistantError::Transport("mock poisoned".to_owned()))?;
        inner.requests.push(request.clone());
        match inner.responses.pop_front() {
            Some(Ok(plans)) => Ok(plans),
            Some(Err(error)) => Err(AssistantError::Transport(error)),
            None => Err(AssistantError::Transport("no queued response".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_core::PlannedTable;

    fn request() -> SeatingRequest {
        SeatingRequest {
            guest_list: "Ada\nGrace\nEdsger".to_owned(),
            plan_count: 1,
        }
    }

    fn plan() -> SeatingPlan {
        SeatingPlan {
            id: "p1".into(),
            name: "Option A".into(),
            score: Some(0.8),
            tables: vec![PlannedTable {
                name: "T1".into(),
                guests: vec!["Ada".into()],
            }],
        }
    }

    #[tokio::test]
    async fn mock_returns_queued_plans() {
        let mock = MockAssistant::new();
        mock.queue_plans(vec![plan()]);

        let plans = mock.generate(&request()).await.unwrap();
        assert_eq!(plans, vec![plan()]);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn fallback_kicks_in_on_failure() {
        let mock = MockAssistant::new();
        mock.fail_next("connection refused");

        let (plans, source) = plans_or_fallback(&mock, &request()).await;
        assert_eq!(source, PlanSource::Fallback);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "fallback");
        assert_eq!(plans[0].tables[0].guests, vec!["Ada", "Grace", "Edsger"]);
    }

    #[tokio::test]
    async fn fallback_kicks_in_on_empty_answer() {
        let mock = MockAssistant::new();
        mock.queue_plans(Vec::new());

        let (_, source) = plans_or_fallback(&mock, &request()).await;
        assert_eq!(source, PlanSource::Fallback);
    }

    #[tokio::test]
    async fn assistant_plans_win_when_available() {
        let mock = MockAssistant::new();
        mock.queue_plans(vec![plan()]);

        let (plans, source) = plans_or_fallback(&mock, &request()).await;
        assert_eq!(source, PlanSource::Assistant);
        assert_eq!(plans[0].id, "p1");
    }
}
