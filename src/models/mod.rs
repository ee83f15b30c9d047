use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SHORT_SESSION_HOURS: i64 = 12;
pub const REMEMBER_SESSION_DAYS: i64 = 30;

/// Client-cached proof of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub employee_name: String,
    #[serde(default)]
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    // TTL is picked by the "remember me" flag
    pub fn new(employee_name: &str, username: &str, remember: bool, now: DateTime<Utc>) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + Self::ttl(remember),
        }
    }

    pub fn ttl(remember: bool) -> Duration {
        if remember {
            Duration::days(REMEMBER_SESSION_DAYS)
        } else {
            Duration::hours(SHORT_SESSION_HOURS)
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && !self.employee_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    In,
    Out,
    None,
}

impl AttendanceState {
    // Anything the backend sends that we don't recognise means "no events today"
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()).as_deref() {
            Some("IN") => AttendanceState::In,
            Some("OUT") => AttendanceState::Out,
            _ => AttendanceState::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceState::In => "CLOCKED IN",
            AttendanceState::Out => "CLOCKED OUT",
            AttendanceState::None => "NOT CLOCKED TODAY",
        }
    }
}

/// Server-reported attendance for the current day. Never persisted locally.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceStatus {
    pub state: AttendanceState,
    pub since: Option<DateTime<Utc>>,
}

impl AttendanceStatus {
    pub fn none() -> Self {
        Self {
            state: AttendanceState::None,
            since: None,
        }
    }

    /// Start instant for the duration counter, only while clocked in.
    pub fn clocked_in_since(&self) -> Option<DateTime<Utc>> {
        match self.state {
            AttendanceState::In => self.since,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEventKind {
    #[serde(rename = "CLOCK_IN")]
    ClockIn,
    #[serde(rename = "CLOCK_OUT")]
    ClockOut,
}

impl ClockEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockEventKind::ClockIn => "CLOCK_IN",
            ClockEventKind::ClockOut => "CLOCK_OUT",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ClockEventKind::ClockIn => "Clocking In",
            ClockEventKind::ClockOut => "Clocking Out",
        }
    }
}

impl fmt::Display for ClockEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Outbound clock submission. Fire-and-forget, nothing is kept locally.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockEvent {
    pub employee_name: String,
    pub kind: ClockEventKind,
    pub position: Option<Coordinates>,
    pub user_agent: String,
}

impl ClockEvent {
    pub fn new(employee_name: &str, kind: ClockEventKind, position: Option<Coordinates>) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            kind,
            position,
            user_agent: user_agent(),
        }
    }
}

pub fn user_agent() -> String {
    format!(
        "timeclock/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
