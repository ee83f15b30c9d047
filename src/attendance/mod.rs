//! Session/attendance view-model.
//!
//! Owns the cached [`Session`], the last displayed [`AttendanceStatus`] and
//! the duration ticker. Constructed when a page opens, dropped when it closes;
//! dropping it cancels the ticker.

pub mod duration;
pub mod ticker;

use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::TimeclockApi;
use crate::clock::Clock;
use crate::error::ClientError;
use crate::geo::{locate_best_effort, Geolocator};
use crate::models::{AttendanceStatus, ClockEvent, ClockEventKind, Session};
use crate::session::SessionStore;
use crate::ui::Screen;

use self::duration::{duration_value, format_local, PLACEHOLDER};
use self::ticker::DurationTicker;

pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_millis(6000);

/// Disables the action controls and re-enables them on drop, whatever the
/// outcome of the action was.
pub struct ControlsGuard<'a> {
    screen: &'a dyn Screen,
}

impl<'a> ControlsGuard<'a> {
    pub fn engage(screen: &'a dyn Screen) -> Self {
        screen.set_controls_enabled(false);
        Self { screen }
    }
}

impl Drop for ControlsGuard<'_> {
    fn drop(&mut self) {
        self.screen.set_controls_enabled(true);
    }
}

/// Short human-readable rendering of a failed action.
pub fn describe(err: &ClientError) -> String {
    match err {
        ClientError::Network(msg) => format!("Failed to fetch ({})", msg),
        ClientError::Parse(_) => "Failed to fetch (unexpected reply)".to_string(),
        ClientError::Application(msg) | ClientError::Validation(msg) => msg.clone(),
        ClientError::Session(msg) => format!("Could not store the session ({})", msg),
    }
}

/// Geolocation, user agent, then the clock action. No status refresh.
pub async fn send_clock_event(
    api: &dyn TimeclockApi,
    geo: &dyn Geolocator,
    geo_timeout: Duration,
    employee_name: &str,
    kind: ClockEventKind,
) -> Result<(), ClientError> {
    let position = locate_best_effort(geo, geo_timeout).await;
    let event = ClockEvent::new(employee_name, kind, position);
    debug!(
        "Submitting {} for {} (position: {})",
        kind,
        employee_name,
        if position.is_some() { "yes" } else { "none" }
    );
    api.clock(&event).await
}

pub struct ClockViewModel {
    api: Arc<dyn TimeclockApi>,
    sessions: Arc<dyn SessionStore>,
    geo: Arc<dyn Geolocator>,
    clock: Arc<dyn Clock>,
    screen: Arc<dyn Screen>,
    geo_timeout: Duration,
    display_offset: FixedOffset,
    live_duration: bool,
    session: Option<Session>,
    // None after a failed refresh: status is unknown
    status: Option<AttendanceStatus>,
    ticker: DurationTicker,
}

impl ClockViewModel {
    pub fn new(
        api: Arc<dyn TimeclockApi>,
        sessions: Arc<dyn SessionStore>,
        geo: Arc<dyn Geolocator>,
        clock: Arc<dyn Clock>,
        screen: Arc<dyn Screen>,
    ) -> Self {
        Self {
            api,
            sessions,
            geo,
            clock,
            screen,
            geo_timeout: DEFAULT_GEO_TIMEOUT,
            display_offset: Utc.fix(),
            live_duration: true,
            session: None,
            status: None,
            ticker: DurationTicker::new(),
        }
    }

    pub fn with_geo_timeout(mut self, geo_timeout: Duration) -> Self {
        self.geo_timeout = geo_timeout;
        self
    }

    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// One-shot commands render the duration once instead of ticking.
    pub fn with_live_duration(mut self, live: bool) -> Self {
        self.live_duration = live;
        self
    }

    pub fn status(&self) -> Option<&AttendanceStatus> {
        self.status.as_ref()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn screen(&self) -> &Arc<dyn Screen> {
        &self.screen
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn geo(&self) -> &Arc<dyn Geolocator> {
        &self.geo
    }

    pub fn display_offset(&self) -> &FixedOffset {
        &self.display_offset
    }

    /// Remote credential check. On success persists a session whose TTL
    /// depends on `remember`; the collaborator's error text is kept verbatim.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, ClientError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let employee_name = self
            .api
            .login(username, password)
            .await?
            .unwrap_or_else(|| username.to_string());

        let session = Session::new(&employee_name, username, remember, self.clock.now());
        self.sessions.save(&session)?;
        info!(
            "Signed in {} as {} until {}",
            username, session.employee_name, session.expires_at
        );

        self.session = Some(session.clone());
        Ok(session)
    }

    // Missing, unreadable and expired sessions all look the same to the caller
    pub fn current_session(&mut self) -> Option<Session> {
        let now = self.clock.now();

        if let Some(session) = self.session.as_ref().filter(|s| s.is_valid_at(now)) {
            return Some(session.clone());
        }

        let stored = match self.sessions.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Session could not be read: {}", e);
                None
            }
        };

        match stored {
            Some(session) if session.is_valid_at(now) => {
                self.session = Some(session.clone());
                Some(session)
            }
            Some(expired) => {
                debug!("Session for {} expired at {}", expired.employee_name, expired.expires_at);
                if let Err(e) = self.sessions.clear() {
                    warn!("Expired session could not be removed: {}", e);
                }
                self.session = None;
                None
            }
            None => {
                self.session = None;
                None
            }
        }
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.ticker.stop();
        self.session = None;
        self.status = None;
        self.sessions.clear()
    }

    /// One round trip. Failures never escape: they leave an unknown status
    /// and a visible error.
    pub async fn refresh_status(&mut self, employee_name: &str) -> Option<AttendanceStatus> {
        self.screen.clear_error();

        match self.api.status(employee_name).await {
            Ok(status) => {
                debug!("Status for {}: {:?}", employee_name, status);
                self.status = Some(status);
            }
            Err(e) => {
                warn!("Status refresh failed for {}: {}", employee_name, e);
                self.screen.show_error("Failed to fetch status");
                self.status = None;
            }
        }

        self.render_status();
        self.status.clone()
    }

    /// Submits a clock event, then refreshes status once the submission has
    /// finished. A failed submission leaves the displayed status untouched.
    pub async fn record_clock_event(
        &mut self,
        employee_name: &str,
        kind: ClockEventKind,
    ) -> Result<(), ClientError> {
        let screen = Arc::clone(&self.screen);
        let _controls = ControlsGuard::engage(screen.as_ref());
        screen.clear_error();

        let sent = send_clock_event(
            self.api.as_ref(),
            self.geo.as_ref(),
            self.geo_timeout,
            employee_name,
            kind,
        )
        .await;

        if let Err(e) = sent {
            warn!("{} failed for {}: {}", kind, employee_name, e);
            screen.show_error(&describe(&e));
            return Err(e);
        }

        info!("{} recorded for {}", kind, employee_name);
        self.refresh_status(employee_name).await;
        Ok(())
    }

    /// Draws status, since and duration; (re)starts the ticker when clocked in.
    pub fn render_status(&mut self) {
        self.ticker.stop();

        let label = match &self.status {
            Some(status) => status.state.label(),
            None => "UNKNOWN",
        };
        let since = self.status.as_ref().and_then(|s| s.since);
        let start = self.status.as_ref().and_then(|s| s.clocked_in_since());

        self.screen.status_line(&format!("STATUS: {}", label));
        self.screen
            .since_line(&format!("Since: {}", format_local(since, &self.display_offset)));

        match start {
            Some(start) => {
                let text = duration_value(Some(start), self.clock.now());
                self.screen.duration_line(&format!("Duration: {}", text));
                if self.live_duration {
                    self.ticker
                        .start(start, Arc::clone(&self.clock), Arc::clone(&self.screen));
                }
            }
            None => self
                .screen
                .duration_line(&format!("Duration: {}", PLACEHOLDER)),
        }
    }

    pub fn stop_ticking(&mut self) {
        self.ticker.stop();
    }
}
