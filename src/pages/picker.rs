use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::TimeclockApi;
use crate::attendance::{describe, send_clock_event, ControlsGuard, DEFAULT_GEO_TIMEOUT};
use crate::error::ClientError;
use crate::geo::Geolocator;
use crate::models::ClockEventKind;
use crate::ui::Screen;

/// Kiosk variant without login: pick a name from the roster per submission.
pub struct PickerPage {
    api: Arc<dyn TimeclockApi>,
    geo: Arc<dyn Geolocator>,
    screen: Arc<dyn Screen>,
    geo_timeout: Duration,
    roster: Vec<String>,
    selected: Option<String>,
}

impl PickerPage {
    pub fn new(
        api: Arc<dyn TimeclockApi>,
        geo: Arc<dyn Geolocator>,
        screen: Arc<dyn Screen>,
    ) -> Self {
        Self {
            api,
            geo,
            screen,
            geo_timeout: DEFAULT_GEO_TIMEOUT,
            roster: Vec::new(),
            selected: None,
        }
    }

    pub fn with_geo_timeout(mut self, geo_timeout: Duration) -> Self {
        self.geo_timeout = geo_timeout;
        self
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub async fn load_employees(&mut self) -> &[String] {
        self.selected = None;
        match self.api.employees().await {
            Ok(names) => {
                info!("Loaded {} employees", names.len());
                self.roster = names;
            }
            Err(e) => {
                warn!("Roster load failed: {}", e);
                self.roster.clear();
                self.screen.show_error("Could not load employees.");
            }
        }
        &self.roster
    }

    // With a roster loaded, only listed names are accepted (case-insensitive)
    pub fn select(&mut self, name: &str) -> Result<&str, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            self.selected = None;
            return Err(ClientError::Validation(
                "Please choose your name first.".to_string(),
            ));
        }

        let chosen = if self.roster.is_empty() {
            name.to_string()
        } else {
            self.roster
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| ClientError::Validation(format!("{} is not on the roster.", name)))?
        };

        Ok(self.selected.insert(chosen).as_str())
    }

    /// Sends the event for the chosen name and resets the choice on success.
    pub async fn submit(&mut self, kind: ClockEventKind) -> Result<(), ClientError> {
        let employee = match self.selected.clone() {
            Some(name) => name,
            None => {
                let err = ClientError::Validation("Please choose your name first.".to_string());
                self.screen.show_error(&describe(&err));
                return Err(err);
            }
        };

        let screen = Arc::clone(&self.screen);
        let _controls = ControlsGuard::engage(screen.as_ref());
        screen.notice("Saving…");

        let sent = send_clock_event(
            self.api.as_ref(),
            self.geo.as_ref(),
            self.geo_timeout,
            &employee,
            kind,
        )
        .await;

        match sent {
            Ok(()) => {
                info!("{} recorded for {}", kind, employee);
                screen.notice(&format!("Thank you for {}.", kind.verb()));
                self.selected = None;
                Ok(())
            }
            Err(e) => {
                warn!("{} failed for {}: {}", kind, employee, e);
                screen.show_error(&format!("Error: {}", describe(&e)));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockTimeclockApi;
    use crate::geo::NoLocator;
    use crate::ui::RecordingScreen;

    fn page(api: MockTimeclockApi, screen: Arc<RecordingScreen>) -> PickerPage {
        PickerPage::new(Arc::new(api), Arc::new(NoLocator), screen)
    }

    fn roster_api() -> MockTimeclockApi {
        let mut api = MockTimeclockApi::new();
        api.expect_employees()
            .returning(|| Ok(vec!["Asha Gurung".to_string(), "Bikash Rai".to_string()]));
        api
    }

    #[tokio::test]
    async fn roster_failure_is_shown_and_leaves_an_empty_list() {
        let mut api = MockTimeclockApi::new();
        api.expect_employees()
            .returning(|| Err(ClientError::Network("Network error 500".to_string())));
        let screen = Arc::new(RecordingScreen::new());
        let mut picker = page(api, screen.clone());

        assert!(picker.load_employees().await.is_empty());
        assert_eq!(screen.errors(), vec!["Could not load employees.".to_string()]);
    }

    #[tokio::test]
    async fn selection_is_matched_against_the_roster() {
        let mut picker = page(roster_api(), Arc::new(RecordingScreen::new()));
        picker.load_employees().await;

        assert_eq!(picker.select("asha gurung").unwrap(), "Asha Gurung");
        assert!(picker.select("Nobody").is_err());
        assert!(picker.select("  ").is_err());
        assert_eq!(picker.selected(), None);
    }

    #[tokio::test]
    async fn submitting_without_a_choice_is_refused() {
        let mut api = roster_api();
        api.expect_clock().never();
        let screen = Arc::new(RecordingScreen::new());
        let mut picker = page(api, screen.clone());

        let err = picker.submit(ClockEventKind::ClockIn).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Validation("Please choose your name first.".to_string())
        );
        assert_eq!(screen.errors(), vec!["Please choose your name first.".to_string()]);
    }

    #[tokio::test]
    async fn successful_submission_thanks_and_resets() {
        let mut api = roster_api();
        api.expect_clock()
            .withf(|e| e.employee_name == "Bikash Rai" && e.kind == ClockEventKind::ClockOut)
            .times(1)
            .returning(|_| Ok(()));
        api.expect_status().never();
        let screen = Arc::new(RecordingScreen::new());
        let mut picker = page(api, screen.clone());
        picker.load_employees().await;
        picker.select("Bikash Rai").unwrap();

        picker.submit(ClockEventKind::ClockOut).await.unwrap();

        assert_eq!(
            screen.notices(),
            vec!["Saving…".to_string(), "Thank you for Clocking Out.".to_string()]
        );
        assert_eq!(picker.selected(), None);
        assert!(screen.controls_enabled());
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_choice() {
        let mut api = roster_api();
        api.expect_clock()
            .returning(|_| Err(ClientError::Application("Duplicate punch".to_string())));
        let screen = Arc::new(RecordingScreen::new());
        let mut picker = page(api, screen.clone());
        picker.load_employees().await;
        picker.select("Asha Gurung").unwrap();

        assert!(picker.submit(ClockEventKind::ClockIn).await.is_err());
        assert_eq!(screen.errors(), vec!["Error: Duplicate punch".to_string()]);
        assert_eq!(picker.selected(), Some("Asha Gurung"));
        assert!(screen.controls_enabled());
    }
}
