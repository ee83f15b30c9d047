// One controller per page of the time-clock
pub mod clock;
pub mod leave;
pub mod login;
pub mod picker;

pub use clock::{ClockPage, LoginRequired, PageCommand};
pub use login::LoginForm;
pub use picker::PickerPage;
