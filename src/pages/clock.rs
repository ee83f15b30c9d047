use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::attendance::duration::wall_clock;
use crate::attendance::ticker::WallClockTicker;
use crate::attendance::{describe, ClockViewModel};
use crate::error::ClientError;
use crate::models::ClockEventKind;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No employee session, please log in again.")]
pub struct LoginRequired;

/// What the user can do on the clock page while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Clock(ClockEventKind),
    Refresh,
    Logout,
    Quit,
}

impl PageCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "i" | "in" => Some(PageCommand::Clock(ClockEventKind::ClockIn)),
            "o" | "out" => Some(PageCommand::Clock(ClockEventKind::ClockOut)),
            "r" | "refresh" | "" => Some(PageCommand::Refresh),
            "logout" => Some(PageCommand::Logout),
            "q" | "quit" | "exit" => Some(PageCommand::Quit),
            _ => None,
        }
    }
}

/// Clock page controller: needs a live session, shows attendance for it.
pub struct ClockPage {
    vm: ClockViewModel,
    employee_name: String,
    poll_interval: Duration,
}

impl ClockPage {
    // Session check comes before anything is drawn
    pub fn open(mut vm: ClockViewModel, poll_interval: Duration) -> Result<Self, LoginRequired> {
        let session = vm.current_session().ok_or(LoginRequired)?;
        debug!("Clock page opened for {}", session.employee_name);

        Ok(Self {
            vm,
            employee_name: session.employee_name,
            poll_interval,
        })
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn view_model(&self) -> &ClockViewModel {
        &self.vm
    }

    pub fn render_wall_clock(&self) {
        let now = self.vm.clock().now();
        self.vm
            .screen()
            .wall_clock(&wall_clock(now, self.vm.display_offset()));
    }

    pub async fn load_status(&mut self) {
        let name = self.employee_name.clone();
        self.vm.refresh_status(&name).await;
    }

    pub async fn punch(&mut self, kind: ClockEventKind) -> Result<(), ClientError> {
        let name = self.employee_name.clone();
        self.vm.record_clock_event(&name, kind).await
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        info!("Logging out {}", self.employee_name);
        self.vm.logout()
    }

    /// Event loop of an open page: wall clock every second, status polling,
    /// user commands. Runs until `shutdown` resolves, a Quit arrives or the
    /// command channel closes.
    pub async fn run<F>(&mut self, mut commands: mpsc::UnboundedReceiver<PageCommand>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut polls = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        polls.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.render_wall_clock();
        let _wall = WallClockTicker::start(
            self.vm.clock().clone(),
            self.vm.screen().clone(),
            *self.vm.display_offset(),
        );
        self.load_status().await;

        let mut deferred = VecDeque::new();
        loop {
            let command = match deferred.pop_front() {
                Some(command) => Some(command),
                None => tokio::select! {
                    _ = &mut shutdown => break,
                    _ = polls.tick() => {
                        self.load_status().await;
                        continue;
                    }
                    command = commands.recv() => command,
                },
            };

            match command {
                Some(PageCommand::Clock(kind)) => {
                    // errors are already on screen
                    let _ = self.punch(kind).await;
                    // presses made while the submission was in flight
                    while let Ok(queued) = commands.try_recv() {
                        match queued {
                            PageCommand::Clock(kind) => debug!("Ignoring {} while busy", kind),
                            other => deferred.push_back(other),
                        }
                    }
                }
                Some(PageCommand::Refresh) => self.load_status().await,
                Some(PageCommand::Logout) => {
                    match self.logout() {
                        Ok(()) => self.vm.screen().notice("Signed out."),
                        Err(e) => self.vm.screen().show_error(&describe(&e)),
                    }
                    break;
                }
                Some(PageCommand::Quit) | None => break,
            }
        }

        self.vm.stop_ticking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockTimeclockApi, TimeclockApi};
    use crate::clock::ManualClock;
    use crate::geo::NoLocator;
    use crate::models::{AttendanceState, AttendanceStatus, Session};
    use crate::session::{MemorySessionStore, SessionStore};
    use crate::ui::{RecordingScreen, ScreenEvent};
    use crate::models::ClockEvent;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn view_model(
        api: MockTimeclockApi,
        sessions: Arc<MemorySessionStore>,
        screen: Arc<RecordingScreen>,
    ) -> ClockViewModel {
        ClockViewModel::new(
            Arc::new(api),
            sessions,
            Arc::new(NoLocator),
            Arc::new(ManualClock::new(morning())),
            screen,
        )
    }

    fn signed_in() -> Arc<MemorySessionStore> {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions
            .save(&Session::new("Asha", "asha", false, morning()))
            .unwrap();
        sessions
    }

    #[test]
    fn commands_parse_from_short_and_long_forms() {
        assert_eq!(PageCommand::parse("i"), Some(PageCommand::Clock(ClockEventKind::ClockIn)));
        assert_eq!(PageCommand::parse(" OUT "), Some(PageCommand::Clock(ClockEventKind::ClockOut)));
        assert_eq!(PageCommand::parse("q"), Some(PageCommand::Quit));
        assert_eq!(PageCommand::parse("logout"), Some(PageCommand::Logout));
        assert_eq!(PageCommand::parse(""), Some(PageCommand::Refresh));
        assert_eq!(PageCommand::parse("dance"), None);
    }

    #[tokio::test]
    async fn no_session_redirects_before_drawing() {
        let screen = Arc::new(RecordingScreen::new());
        let vm = view_model(
            MockTimeclockApi::new(),
            Arc::new(MemorySessionStore::new()),
            screen.clone(),
        );

        assert!(matches!(ClockPage::open(vm, Duration::from_secs(60)), Err(LoginRequired)));
        assert!(screen.events().is_empty());
    }

    #[tokio::test]
    async fn expired_session_redirects_too() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions
            .save(&Session::new(
                "Asha",
                "asha",
                false,
                morning() - chrono::Duration::hours(13),
            ))
            .unwrap();
        let vm = view_model(MockTimeclockApi::new(), sessions, Arc::new(RecordingScreen::new()));

        assert!(ClockPage::open(vm, Duration::from_secs(60)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loads_status_handles_commands_and_quits() {
        let mut api = MockTimeclockApi::new();
        api.expect_status().returning(|_| {
            Ok(AttendanceStatus {
                state: AttendanceState::Out,
                since: None,
            })
        });
        api.expect_clock()
            .withf(|e| e.kind == ClockEventKind::ClockIn && e.employee_name == "Asha")
            .times(1)
            .returning(|_| Ok(()));
        let screen = Arc::new(RecordingScreen::new());
        let vm = view_model(api, signed_in(), screen.clone());
        let mut page = ClockPage::open(vm, Duration::from_secs(60)).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(PageCommand::Clock(ClockEventKind::ClockIn)).unwrap();
        tx.send(PageCommand::Quit).unwrap();

        page.run(rx, std::future::pending()).await;

        let events = screen.events();
        assert!(events.contains(&ScreenEvent::WallClock("09:00:00 AM".to_string())));
        let statuses = events
            .iter()
            .filter(|e| matches!(e, ScreenEvent::Status(_)))
            .count();
        // initial load plus the refresh after clocking in
        assert_eq!(statuses, 2);
        assert!(!page.view_model().is_ticking());
    }

    #[tokio::test]
    async fn logout_clears_the_stored_session() {
        let sessions = signed_in();
        let vm = view_model(MockTimeclockApi::new(), sessions.clone(), Arc::new(RecordingScreen::new()));
        let mut page = ClockPage::open(vm, Duration::from_secs(60)).unwrap();

        page.logout().unwrap();
        assert_eq!(sessions.raw(), None);
    }

    #[tokio::test]
    async fn logout_command_ends_the_page() {
        let mut api = MockTimeclockApi::new();
        api.expect_status().returning(|_| Ok(AttendanceStatus::none()));
        let sessions = signed_in();
        let screen = Arc::new(RecordingScreen::new());
        let vm = view_model(api, sessions.clone(), screen.clone());
        let mut page = ClockPage::open(vm, Duration::from_secs(60)).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(PageCommand::Logout).unwrap();
        page.run(rx, std::future::pending()).await;

        assert_eq!(sessions.raw(), None);
        assert!(screen.notices().contains(&"Signed out.".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_polled_on_the_interval() {
        let mut api = MockTimeclockApi::new();
        // initial load, then polls at 60s and 120s
        api.expect_status()
            .times(3)
            .returning(|_| Ok(AttendanceStatus::none()));
        let screen = Arc::new(RecordingScreen::new());
        let vm = view_model(api, signed_in(), screen.clone());
        let mut page = ClockPage::open(vm, Duration::from_secs(60)).unwrap();

        let (_tx, rx) = mpsc::unbounded_channel();
        page.run(rx, tokio::time::sleep(Duration::from_secs(125))).await;

        let statuses = screen
            .events()
            .iter()
            .filter(|e| matches!(e, ScreenEvent::Status(_)))
            .count();
        assert_eq!(statuses, 3);
    }

    /// Backend whose clock endpoint takes ten seconds to answer.
    #[derive(Default)]
    struct SlowBackend {
        submissions: AtomicUsize,
    }

    #[async_trait]
    impl TimeclockApi for SlowBackend {
        async fn login(&self, _: &str, _: &str) -> Result<Option<String>, ClientError> {
            Ok(None)
        }

        async fn status(&self, _: &str) -> Result<AttendanceStatus, ClientError> {
            Ok(AttendanceStatus::none())
        }

        async fn clock(&self, _: &ClockEvent) -> Result<(), ClientError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        }

        async fn employees(&self) -> Result<Vec<String>, ClientError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn presses_during_a_submission_are_ignored_and_the_clock_keeps_ticking() {
        let backend = Arc::new(SlowBackend::default());
        let screen = Arc::new(RecordingScreen::new());
        let vm = ClockViewModel::new(
            backend.clone(),
            signed_in(),
            Arc::new(NoLocator),
            Arc::new(ManualClock::new(morning())),
            screen.clone(),
        );
        let mut page = ClockPage::open(vm, Duration::from_secs(600)).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(PageCommand::Clock(ClockEventKind::ClockIn)).unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send(PageCommand::Clock(ClockEventKind::ClockIn)).unwrap();
            tx.send(PageCommand::Refresh).unwrap();
            tokio::time::sleep(Duration::from_secs(20)).await;
            let _ = tx.send(PageCommand::Quit);
        });

        page.run(rx, std::future::pending()).await;

        assert_eq!(backend.submissions.load(Ordering::SeqCst), 1);
        let redraws = screen
            .events()
            .iter()
            .filter(|e| matches!(e, ScreenEvent::WallClock(_)))
            .count();
        // one initial draw plus one per second over 22 seconds
        assert!(redraws >= 21, "only {} wall clock redraws", redraws);
        // initial load, refresh after clocking in, then the queued Refresh
        let statuses = screen
            .events()
            .iter()
            .filter(|e| matches!(e, ScreenEvent::Status(_)))
            .count();
        assert_eq!(statuses, 3);
    }
}
