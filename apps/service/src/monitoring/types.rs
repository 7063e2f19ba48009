use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Protocol used to reach a check's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// HTTP method a check probes with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "get"),
            Method::Post => write!(f, "post"),
            Method::Put => write!(f, "put"),
            Method::Delete => write!(f, "delete"),
        }
    }
}

/// Up/down classification of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Up,
    #[default]
    Down,
}

impl CheckState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "up" => Some(CheckState::Up),
            "down" => Some(CheckState::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckState::Up => write!(f, "up"),
            CheckState::Down => write!(f, "down"),
        }
    }
}

/// A monitored endpoint, as persisted in the `checks` collection.
///
/// `state` and `last_checked` are only ever written together, see
/// [`Check::record_probe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,

    /// Phone number of the owning user (10 digits, no country code)
    #[serde(rename = "userPhone", alias = "ownerId")]
    pub owner_phone: String,

    pub protocol: Protocol,

    /// Target without scheme, e.g. `example.com/health`
    pub url: String,

    pub method: Method,

    pub success_codes: BTreeSet<i64>,

    pub timeout_seconds: u64,

    #[serde(default)]
    pub state: CheckState,

    /// Unix epoch milliseconds of the last probe; `None` means never probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
}

impl Check {
    /// Full URL the prober requests
    pub fn target(&self) -> String {
        format!("{}://{}", self.protocol, self.url)
    }

    /// Whether this check has been probed at least once
    pub fn has_been_checked(&self) -> bool {
        self.last_checked.is_some()
    }

    /// Copy of this check carrying a new state and probe time
    pub fn record_probe(&self, state: CheckState, checked_at: i64) -> Self {
        Self { state, last_checked: Some(checked_at), ..self.clone() }
    }
}

/// Why a probe did not yield a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Transport,
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// What a single probe observed. Exactly one per probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Response {
        #[serde(rename = "responseCode")]
        response_code: u16,
        #[serde(rename = "latencyMs")]
        latency_ms: u64,
    },
    Error {
        error: ErrorKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl Outcome {
    pub fn response(response_code: u16, latency_ms: u64) -> Self {
        Outcome::Response { response_code, latency_ms }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Outcome::Error { error: ErrorKind::Transport, detail: Some(detail.into()) }
    }

    pub fn timeout() -> Self {
        Outcome::Error { error: ErrorKind::Timeout, detail: None }
    }

    pub fn response_code(&self) -> Option<u16> {
        match self {
            Outcome::Response { response_code, .. } => Some(*response_code),
            Outcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Response { .. } => None,
            Outcome::Error { error, .. } => Some(*error),
        }
    }
}

/// One line of a check's audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The check as it was before this probe
    pub check: Check,
    pub outcome: Outcome,
    pub state: CheckState,
    /// Whether an alert was delivered for this probe
    pub alert: bool,
    /// Unix epoch milliseconds
    pub time: i64,
}
