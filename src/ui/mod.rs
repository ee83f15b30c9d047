use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use tokio::time::Duration;

/// Rendering surface for a page controller.
///
/// Methods take `&self` so the duration ticker can hold a shared handle
/// while the controller keeps rendering status lines.
pub trait Screen: Send + Sync {
    fn status_line(&self, text: &str);
    fn since_line(&self, text: &str);
    fn duration_line(&self, text: &str);
    fn wall_clock(&self, text: &str);
    fn notice(&self, text: &str);
    fn show_error(&self, message: &str);
    fn clear_error(&self);
    fn set_controls_enabled(&self, enabled: bool);
}

// Styled spinner creation
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

// Banner shown once per run
pub fn init_ui(title: &str, today: &str) {
    println!(
        "{} {} {}",
        "🕒".green(),
        title.bold().blue(),
        "🕒".green()
    );
    println!("{}", today.yellow());
}

#[derive(Default)]
struct LiveLine {
    clock: String,
    duration: String,
    busy: bool,
}

/// Terminal screen. Status lines scroll; the wall clock and duration share
/// one live spinner line at the bottom.
pub struct TerminalScreen {
    live: ProgressBar,
    line: Mutex<LiveLine>,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self {
            live: create_spinner(""),
            line: Mutex::new(LiveLine::default()),
        }
    }

    // Print the live line once more as plain text and stop the spinner
    pub fn finish(&self) {
        let line = self.line.lock().unwrap_or_else(|e| e.into_inner());
        let text = Self::compose(&line);
        self.live.finish_and_clear();
        if !text.is_empty() {
            println!("{}", text);
        }
    }

    fn compose(line: &LiveLine) -> String {
        let mut parts = Vec::new();
        if !line.clock.is_empty() {
            parts.push(line.clock.cyan().to_string());
        }
        if !line.duration.is_empty() {
            parts.push(line.duration.bold().to_string());
        }
        if line.busy {
            parts.push("working…".yellow().to_string());
        }
        parts.join("  │  ")
    }

    fn update(&self, apply: impl FnOnce(&mut LiveLine)) {
        let mut line = self.line.lock().unwrap_or_else(|e| e.into_inner());
        apply(&mut line);
        self.live.set_message(Self::compose(&line));
    }
}

impl Default for TerminalScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for TerminalScreen {
    fn status_line(&self, text: &str) {
        let styled = if text.contains("CLOCKED IN") {
            text.green().bold()
        } else if text.contains("UNKNOWN") {
            text.red().bold()
        } else {
            text.blue().bold()
        };
        self.live.println(format!("📋 {}", styled));
    }

    fn since_line(&self, text: &str) {
        self.live.println(format!("   {}", text));
    }

    fn duration_line(&self, text: &str) {
        self.update(|line| line.duration = text.to_string());
    }

    fn wall_clock(&self, text: &str) {
        self.update(|line| line.clock = text.to_string());
    }

    fn notice(&self, text: &str) {
        self.live.println(format!("✅ {}", text.green()));
    }

    fn show_error(&self, message: &str) {
        self.live.println(format!("❌ {}", message.red().bold()));
    }

    fn clear_error(&self) {}

    fn set_controls_enabled(&self, enabled: bool) {
        self.update(|line| line.busy = !enabled);
    }
}

/// What a screen was told, in order. Used by tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    Status(String),
    Since(String),
    Duration(String),
    WallClock(String),
    Notice(String),
    Error(String),
    ErrorCleared,
    Controls(bool),
}

#[derive(Debug, Default)]
pub struct RecordingScreen {
    events: Mutex<Vec<ScreenEvent>>,
}

impl RecordingScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScreenEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_duration(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            ScreenEvent::Duration(text) => Some(text),
            _ => None,
        })
    }

    pub fn last_status(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            ScreenEvent::Status(text) => Some(text),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ScreenEvent::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ScreenEvent::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn controls_enabled(&self) -> bool {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                ScreenEvent::Controls(enabled) => Some(enabled),
                _ => None,
            })
            .unwrap_or(true)
    }

    fn push(&self, event: ScreenEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl Screen for RecordingScreen {
    fn status_line(&self, text: &str) {
        self.push(ScreenEvent::Status(text.to_string()));
    }

    fn since_line(&self, text: &str) {
        self.push(ScreenEvent::Since(text.to_string()));
    }

    fn duration_line(&self, text: &str) {
        self.push(ScreenEvent::Duration(text.to_string()));
    }

    fn wall_clock(&self, text: &str) {
        self.push(ScreenEvent::WallClock(text.to_string()));
    }

    fn notice(&self, text: &str) {
        self.push(ScreenEvent::Notice(text.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.push(ScreenEvent::Error(message.to_string()));
    }

    fn clear_error(&self) {
        self.push(ScreenEvent::ErrorCleared);
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.push(ScreenEvent::Controls(enabled));
    }
}
