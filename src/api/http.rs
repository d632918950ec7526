// src/api/http.rs

use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::api::{CallOutcome, MegaverseApi};
use crate::goal::GoalError;
use crate::model::{GoalGrid, ObjectKind, PlacementObject, Position};

const DEFAULT_BASE_URL: &str = "https://challenge.crossmint.io/api";

/// Error bodies the server uses to signal throttling, matched on top of the
/// plain 429 status because some proxies rewrite the status line.
const RATE_LIMIT_PATTERN: &str = r"(?i)too many requests";

/// Connection details for the placement service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub candidate_id: String,
}

impl ApiConfig {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            candidate_id: candidate_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Client for the megaverse placement service.
pub struct HttpMegaverseApi {
    http: reqwest::blocking::Client,
    config: ApiConfig,
    rate_limit: Regex,
}

impl HttpMegaverseApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
            rate_limit: Regex::new(RATE_LIMIT_PATTERN).unwrap(),
        }
    }

    fn call(&self, method: Method, kind: ObjectKind, body: Value) -> CallOutcome {
        let url = format!("{}/{}", self.config.base_url, endpoint(kind));
        debug!(%url, %kind, "issuing {} call", method);

        match self.http.request(method, &url).json(&body).send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return CallOutcome::success();
                }
                let message = error_message(status.as_u16(), &response.text().unwrap_or_default());
                if status.as_u16() == 429 || self.rate_limit.is_match(&message) {
                    CallOutcome::rate_limited(&message)
                } else {
                    CallOutcome::failure(&message)
                }
            }
            Err(err) => {
                let message = format!("request failed: {err}");
                if self.rate_limit.is_match(&message) {
                    CallOutcome::rate_limited(&message)
                } else {
                    CallOutcome::failure(&message)
                }
            }
        }
    }
}

impl MegaverseApi for HttpMegaverseApi {
    fn create_object(&self, object: &PlacementObject) -> CallOutcome {
        self.call(
            Method::POST,
            object.kind(),
            payload(&self.config.candidate_id, object),
        )
    }

    fn delete_object(&self, kind: ObjectKind, position: Position) -> CallOutcome {
        let body = json!({
            "candidateId": self.config.candidate_id,
            "row": position.row,
            "column": position.column,
        });
        self.call(Method::DELETE, kind, body)
    }

    fn fetch_goal(&self) -> Result<GoalGrid, GoalError> {
        let url = format!(
            "{}/map/{}/goal",
            self.config.base_url, self.config.candidate_id
        );
        debug!(%url, "fetching goal grid");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GoalError::Api {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &response.text().unwrap_or_default()),
            });
        }

        let body: GoalResponse = response.json()?;
        body.goal.ok_or(GoalError::MissingGrid)
    }
}

#[derive(Deserialize)]
struct GoalResponse {
    goal: Option<GoalGrid>,
}

fn endpoint(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Polyanet => "polyanets",
        ObjectKind::Soloon => "soloons",
        ObjectKind::Cometh => "comeths",
    }
}

/// Create-call body: position plus the kind-specific attribute. The match
/// is exhaustive so a new kind cannot ship without a wire encoding.
fn payload(candidate_id: &str, object: &PlacementObject) -> Value {
    let position = object.position();
    let mut body = json!({
        "candidateId": candidate_id,
        "row": position.row,
        "column": position.column,
    });
    match object {
        PlacementObject::Polyanet(_) => {}
        PlacementObject::Soloon(_, color) => {
            body["color"] = json!(color.as_str());
        }
        PlacementObject::Cometh(_, direction) => {
            body["direction"] = json!(direction.as_str());
        }
    }
    body
}

/// Pulls a human-readable message out of an error body, falling back to the
/// status code when the body is empty or not JSON.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {trimmed}")
    }
}
