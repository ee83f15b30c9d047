use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use timeclock::api::{HttpApi, TimeclockApi};
use timeclock::attendance::duration::today;
use timeclock::attendance::ClockViewModel;
use timeclock::clock::{Clock, SystemClock};
use timeclock::config::Config;
use timeclock::geo::{locator_for, Geolocator};
use timeclock::logging::init_logging;
use timeclock::models::ClockEventKind;
use timeclock::pages::leave::leave_request_link;
use timeclock::pages::{login, ClockPage, LoginForm, PageCommand, PickerPage};
use timeclock::session::{FileSessionStore, SessionStore};
use timeclock::ui::{init_ui, Screen, TerminalScreen};

const EXIT_LOGIN_REQUIRED: u8 = 2;

#[derive(Parser)]
#[command(name = "timeclock")]
#[command(about = "Employee clock-in / clock-out terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache a session
    Login {
        #[arg(short, long)]
        username: String,
        /// Falls back to TIMECLOCK_PASSWORD, then a prompt
        #[arg(short, long)]
        password: Option<String>,
        /// Keep the session for 30 days instead of 12 hours
        #[arg(short, long, default_value_t = false)]
        remember: bool,
    },
    /// Forget the cached session
    Logout,
    /// Show today's attendance once
    Status,
    /// Clock in with the signed-in employee
    In,
    /// Clock out with the signed-in employee
    Out,
    /// Live clock page: [i]n, [o]ut, [r]efresh, logout, [q]uit
    Watch,
    /// List the roster (no login needed)
    Employees,
    /// Clock in or out for a roster name (no login needed)
    Punch {
        #[arg(short, long)]
        employee: String,
        #[arg(value_enum)]
        event: PunchEvent,
    },
    /// Print the leave-request link for the signed-in employee
    Leave,
}

#[derive(Clone, Copy, ValueEnum)]
enum PunchEvent {
    In,
    Out,
}

impl From<PunchEvent> for ClockEventKind {
    fn from(event: PunchEvent) -> Self {
        match event {
            PunchEvent::In => ClockEventKind::ClockIn,
            PunchEvent::Out => ClockEventKind::ClockOut,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let _log_guard = init_logging(config.log_dir.as_deref());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    init_ui(
        "Employee Time Clock",
        &today(clock.now(), &config.display_offset),
    );

    match cli.command {
        Commands::Logout => logout(&config),
        Commands::Employees => list_employees(&config).await,
        Commands::Punch { employee, event } => punch(&config, &employee, event.into()).await,
        command => session_command(&config, clock, command).await,
    }
}

fn remote_api(config: &Config, url: &str) -> Result<Arc<dyn TimeclockApi>> {
    let roster = config.roster_url.as_deref().unwrap_or(url);
    let api = HttpApi::new(url, roster, config.http_timeout)
        .context("Could not build the HTTP client")?;
    Ok(Arc::new(api))
}

fn geolocator(config: &Config) -> Arc<dyn Geolocator> {
    Arc::from(locator_for(config.fixed_position))
}

// Only the local session file is touched, so no endpoint is needed
fn logout(config: &Config) -> Result<ExitCode> {
    FileSessionStore::new(&config.session_file)
        .clear()
        .context("Could not remove the stored session")?;
    println!("{} {}", "👋".green(), "Signed out.".bold());
    Ok(ExitCode::SUCCESS)
}

async fn session_command(
    config: &Config,
    clock: Arc<dyn Clock>,
    command: Commands,
) -> Result<ExitCode> {
    let api = remote_api(config, config.require_api_url()?)?;
    let screen = Arc::new(TerminalScreen::new());
    let live = matches!(command, Commands::Watch);

    let mut vm = ClockViewModel::new(
        api,
        Arc::new(FileSessionStore::new(&config.session_file)),
        geolocator(config),
        clock,
        screen.clone(),
    )
    .with_geo_timeout(config.geo_timeout)
    .with_display_offset(config.display_offset)
    .with_live_duration(live);

    if let Commands::Login {
        username,
        password,
        remember,
    } = &command
    {
        let password = match password {
            Some(password) => password.clone(),
            None => read_password()?,
        };
        let form = LoginForm::new(username, &password, *remember);
        let signed_in = login::submit(&mut vm, &form).await.is_some();
        screen.finish();
        return Ok(if signed_in { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let mut page = match ClockPage::open(vm, config.poll_interval) {
        Ok(page) => page,
        Err(redirect) => {
            screen.finish();
            eprintln!("{} {}", "🔒".yellow(), redirect.to_string().yellow().bold());
            eprintln!("   Run {} first.", "timeclock login -u <username>".cyan());
            return Ok(ExitCode::from(EXIT_LOGIN_REQUIRED));
        }
    };

    println!("{} {}", "👤".green(), page.employee_name().bold());

    let outcome = match command {
        Commands::Status => {
            page.render_wall_clock();
            page.load_status().await;
            ExitCode::SUCCESS
        }
        Commands::In | Commands::Out => {
            let kind = if matches!(command, Commands::In) {
                ClockEventKind::ClockIn
            } else {
                ClockEventKind::ClockOut
            };
            page.render_wall_clock();
            match page.punch(kind).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Commands::Watch => {
            let commands = spawn_stdin_commands();
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            page.run(commands, shutdown).await;
            ExitCode::SUCCESS
        }
        Commands::Leave => {
            let base = config.require_leave_url()?;
            let url = leave_request_link(base, page.employee_name(), page.view_model().geo().as_ref())
                .await
                .context("TIMECLOCK_LEAVE_URL is not a valid URL")?;
            screen.finish();
            println!("{} {}", "🏖️".green(), url.as_str().cyan());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Login { .. }
        | Commands::Logout
        | Commands::Employees
        | Commands::Punch { .. } => ExitCode::SUCCESS,
    };

    screen.finish();
    Ok(outcome)
}

async fn list_employees(config: &Config) -> Result<ExitCode> {
    let url = config.require_roster_url()?;
    let screen = Arc::new(TerminalScreen::new());
    let mut picker = PickerPage::new(remote_api(config, url)?, geolocator(config), screen.clone());

    let names = picker.load_employees().await.to_vec();
    screen.finish();
    for name in &names {
        println!("  • {}", name);
    }
    Ok(if names.is_empty() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn punch(config: &Config, employee: &str, kind: ClockEventKind) -> Result<ExitCode> {
    let url = config.require_roster_url()?;
    let screen = Arc::new(TerminalScreen::new());
    let mut picker = PickerPage::new(remote_api(config, url)?, geolocator(config), screen.clone())
        .with_geo_timeout(config.geo_timeout);

    picker.load_employees().await;
    let selection = picker.select(employee).map(|_| ());
    let outcome = match selection {
        Ok(()) => match picker.submit(kind).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        },
        Err(e) => {
            screen.show_error(&e.to_string());
            ExitCode::FAILURE
        }
    };
    screen.finish();
    Ok(outcome)
}

// Each stdin line is one button press on the page
fn spawn_stdin_commands() -> mpsc::UnboundedReceiver<PageCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match PageCommand::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => eprintln!("{}", "Commands: in, out, refresh, logout, quit".yellow()),
            }
        }
    });
    rx
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("TIMECLOCK_PASSWORD") {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
