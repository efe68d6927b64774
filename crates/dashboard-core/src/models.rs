use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One API request as captured by the analytics middleware.
///
/// Only `created_at` is required; exports from older middleware versions
/// omit most of the other columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// UTC time the request was received.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// HTTP response status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Handler latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Name of the web framework the middleware was mounted in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

impl RequestEvent {
    /// An event carrying nothing but its timestamp.
    pub fn at(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            path: None,
            method: None,
            status: None,
            response_time: None,
            hostname: None,
            ip_address: None,
            location: None,
            user_agent: None,
            framework: None,
        }
    }

    /// 2xx and 3xx responses count as successful. Events without a status
    /// are not counted either way.
    pub fn is_success(&self) -> Option<bool> {
        self.status.map(|s| (200..400).contains(&s))
    }
}

/// Event fields that can be ranked by frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Path,
    Hostname,
    IpAddress,
    Location,
    UserAgent,
    Framework,
}

impl EventField {
    pub fn get<'a>(&self, event: &'a RequestEvent) -> Option<&'a str> {
        let value = match self {
            EventField::Path => &event.path,
            EventField::Hostname => &event.hostname,
            EventField::IpAddress => &event.ip_address,
            EventField::Location => &event.location,
            EventField::UserAgent => &event.user_agent,
            EventField::Framework => &event.framework,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }
}
