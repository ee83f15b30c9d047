use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::Coordinates;

const DEFAULT_GEO_TIMEOUT_MS: u64 = 6000;
const DEFAULT_POLL_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
// Asia/Kathmandu
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 345;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Option<String>,
    pub roster_url: Option<String>,
    pub leave_url: Option<String>,
    pub session_file: PathBuf,
    pub geo_timeout: Duration,
    pub fixed_position: Option<Coordinates>,
    pub display_offset: FixedOffset,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Split out so tests can feed a map instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("TIMECLOCK_API_URL");
        let roster_url = var("TIMECLOCK_ROSTER_URL").or_else(|| api_url.clone());

        let session_file = match var("TIMECLOCK_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file(var("HOME")),
        };

        let fixed_position = match (var("TIMECLOCK_LAT"), var("TIMECLOCK_LNG")) {
            (Some(lat), Some(lng)) => Some(Coordinates {
                lat: parse_value("TIMECLOCK_LAT", &lat)?,
                lng: parse_value("TIMECLOCK_LNG", &lng)?,
            }),
            _ => None,
        };

        let offset_minutes: i32 = parse_or(
            "TIMECLOCK_UTC_OFFSET_MINUTES",
            var("TIMECLOCK_UTC_OFFSET_MINUTES"),
            DEFAULT_UTC_OFFSET_MINUTES,
        )?;
        let display_offset = FixedOffset::east_opt(offset_minutes * 60)
            .with_context(|| format!("TIMECLOCK_UTC_OFFSET_MINUTES out of range: {}", offset_minutes))?;

        Ok(Self {
            api_url,
            roster_url,
            leave_url: var("TIMECLOCK_LEAVE_URL"),
            session_file,
            geo_timeout: Duration::from_millis(parse_or(
                "TIMECLOCK_GEO_TIMEOUT_MS",
                var("TIMECLOCK_GEO_TIMEOUT_MS"),
                DEFAULT_GEO_TIMEOUT_MS,
            )?),
            fixed_position,
            display_offset,
            poll_interval: Duration::from_secs(positive_or(
                "TIMECLOCK_POLL_SECS",
                var("TIMECLOCK_POLL_SECS"),
                DEFAULT_POLL_SECS,
            )?),
            http_timeout: Duration::from_secs(positive_or(
                "TIMECLOCK_HTTP_TIMEOUT_SECS",
                var("TIMECLOCK_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            log_dir: var("TIMECLOCK_LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn require_api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .context("TIMECLOCK_API_URL env var not set")
    }

    pub fn require_roster_url(&self) -> Result<&str> {
        self.roster_url
            .as_deref()
            .context("TIMECLOCK_ROSTER_URL (or TIMECLOCK_API_URL) env var not set")
    }

    pub fn require_leave_url(&self) -> Result<&str> {
        self.leave_url
            .as_deref()
            .context("TIMECLOCK_LEAVE_URL env var not set")
    }
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".timeclock").join("session.json"),
        None => PathBuf::from(".timeclock_session.json"),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

// Zero is not a usable interval or timeout
fn positive_or(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let value = parse_or(key, raw, default)?;
    if value == 0 {
        bail!("{} must be > 0", key);
    }
    Ok(value)
}
