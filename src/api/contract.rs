// Wire shapes of the hosted script endpoint.
//
// Requests are a flat JSON object keyed by `action`. Every POST reply is
// wrapped as `{ok, data, error?}`; the roster GET replies `{employees:[...]}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::models::{AttendanceState, AttendanceStatus, ClockEvent, ClockEventKind};

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ApiRequest<'a> {
    Login {
        username: &'a str,
        password: &'a str,
    },
    Status {
        #[serde(rename = "employeeName")]
        employee_name: &'a str,
    },
    Clock {
        #[serde(rename = "employeeName")]
        employee_name: &'a str,
        event: ClockEventKind,
        lat: Option<f64>,
        lng: Option<f64>,
        ua: &'a str,
    },
}

impl<'a> ApiRequest<'a> {
    pub fn clock(event: &'a ClockEvent) -> Self {
        ApiRequest::Clock {
            employee_name: &event.employee_name,
            event: event.kind,
            lat: event.position.map(|p| p.lat),
            lng: event.position.map(|p| p.lng),
            ua: &event.user_agent,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::Login { .. } => "login",
            ApiRequest::Status { .. } => "status",
            ApiRequest::Clock { .. } => "clock",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps the outer layer. `data` may legitimately be absent.
    pub fn into_data(self) -> Result<Option<T>, ClientError> {
        if !self.ok {
            return Err(ClientError::Application(
                non_blank(self.error).unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default)]
    pub ok: bool,
    pub employee_name: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusData {
    pub state: Option<String>,
    #[serde(rename = "sinceISO")]
    pub since_iso: Option<String>,
}

impl StatusData {
    pub fn into_status(self) -> AttendanceStatus {
        AttendanceStatus {
            state: AttendanceState::from_wire(self.state.as_deref()),
            since: self.since_iso.as_deref().and_then(parse_instant),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AckData {
    pub ok: Option<bool>,
    pub error: Option<String>,
}

impl AckData {
    pub fn check(self) -> Result<(), ClientError> {
        match self.ok {
            Some(false) => Err(ClientError::Application(
                non_blank(self.error).unwrap_or_else(|| "Request failed".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RosterReply {
    #[serde(default)]
    pub employees: Vec<serde_json::Value>,
}

impl RosterReply {
    // Sheet columns come back with blanks and the odd number; keep real names only
    pub fn names(self) -> Vec<String> {
        self.employees
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => non_blank(Some(s)),
                _ => None,
            })
            .collect()
    }
}

pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
