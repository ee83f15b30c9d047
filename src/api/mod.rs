pub mod contract;
pub mod http;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{AttendanceStatus, ClockEvent};

pub use http::HttpApi;

/// The hosted roster/attendance backend, consumed only through its replies.
///
/// Every call is a single attempt. Nothing here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeclockApi: Send + Sync {
    /// Checks credentials remotely. `Ok(None)` means accepted without a display name.
    async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ClientError>;

    async fn status(&self, employee_name: &str) -> Result<AttendanceStatus, ClientError>;

    async fn clock(&self, event: &ClockEvent) -> Result<(), ClientError>;

    /// Roster for the picker flow.
    async fn employees(&self) -> Result<Vec<String>, ClientError>;
}
