use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::attendance::duration::format_local;
use crate::attendance::{describe, ClockViewModel, ControlsGuard};
use crate::models::Session;

#[derive(Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn new(username: &str, password: &str, remember: bool) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            remember,
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"***")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Runs the login form against the view-model. `None` means the user stays
/// on the login page with the error already shown.
pub async fn submit(vm: &mut ClockViewModel, form: &LoginForm) -> Option<Session> {
    let screen = Arc::clone(vm.screen());
    screen.clear_error();
    let _controls = ControlsGuard::engage(screen.as_ref());
    screen.notice("Signing in…");
    debug!("Login attempt: {:?}", form);

    match vm.login(&form.username, &form.password, form.remember).await {
        Ok(session) => {
            screen.notice(&format!(
                "Signed in as {} (session valid until {})",
                session.employee_name,
                format_local(Some(session.expires_at), vm.display_offset())
            ));
            Some(session)
        }
        Err(e) => {
            screen.show_error(&describe(&e));
            None
        }
    }
}
