//! iron-rest - Rest timer for the terminal
//!
//! Counts down against the wall clock, so the time shown is right even after
//! the process was suspended with Ctrl-Z and resumed later.

mod signals;

use std::io::Write;
use std::time::Duration as StdDuration;

use clap::Parser;
use libironnotes::service::events::EventReceiver;
use libironnotes::service::{scheduler_from_config, IronNotesService};
use libironnotes::timer::{format_clock, ADJUST_STEP_SECS};
use libironnotes::{Config, IronError, Result, RestTimer, SystemClock, TimerState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::signals::{ControlSignal, SignalListener};

#[derive(Parser, Debug)]
#[command(name = "iron-rest")]
#[command(version)]
#[command(about = "Rest timer that keeps time while suspended")]
#[command(long_about = "\
iron-rest - Rest timer that keeps time while suspended

DESCRIPTION:
    iron-rest counts down a rest interval between sets. Remaining time is
    always computed from the wall clock, so suspending the process (Ctrl-Z)
    or a busy machine never makes the timer drift.

    When suspended while running, a notification is scheduled for the moment
    the rest ends. Resuming cancels it.

USAGE:
    # Default rest from config (training.rest_seconds, 90s by default)
    iron-rest

    # Explicit durations
    iron-rest 2m
    iron-rest 90
    iron-rest 1m30s

CONTROLS (type and press Enter):
    p  Pause or resume
    +  Add 10 seconds
    -  Remove 10 seconds
    q  Stop the timer

SIGNALS:
    SIGTSTP        Schedule the completion notification and suspend
    SIGCONT        Cancel the notification and resynchronize the display
    SIGINT/SIGTERM Stop the timer

CONFIGURATION:
    [training]
    rest_seconds = 90

    [timer]
    refresh_millis = 100
    notification_title = \"Rest Timer Complete\"
    notification_body = \"Time to get back to your workout!\"
    notify_command = \"notify-send\"   # run when a suspended timer completes

EXIT CODES:
    0 - Rest completed or stopped
    2 - Configuration error
    3 - Invalid duration
    130 - Interrupted
")]
struct Cli {
    /// Rest duration, e.g. 90, 90s, 2m, 1m30s (default from config)
    #[arg(value_name = "DURATION")]
    duration: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// How the countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Completed,
    /// Stopped from the keyboard with this many seconds left
    Stopped(u32),
    Interrupted(u32),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libironnotes::logging::init_default(cli.verbose);
    debug!("iron-rest started with args: {:?}", cli);

    // Exit explicitly: the blocking stdin reader would otherwise hold the
    // runtime open until the next line of input.
    match run(cli).await {
        Ok(Finish::Interrupted(_)) => std::process::exit(130),
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<Finish> {
    let config = Config::load()?;

    let duration_secs = match cli.duration.as_deref() {
        Some(text) => parse_rest_duration(text)?,
        None => config.training.rest_duration_secs(),
    };

    let refresh_millis = config.timer.refresh_millis;
    let scheduler = scheduler_from_config(&config);
    let service = IronNotesService::from_config(config).await?;
    tokio::spawn(log_events(service.subscribe()));

    let mut timer = service.rest_timer(scheduler);

    let mut listener = SignalListener::new()
        .map_err(|e| IronError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    timer.start(duration_secs);
    let finish = countdown(&mut timer, &mut listener, refresh_millis).await;
    listener.close();

    match finish {
        Finish::Completed => println!("\x07Rest complete"),
        Finish::Stopped(left) | Finish::Interrupted(left) => {
            println!("Rest stopped with {} left", format_clock(left))
        }
    }

    Ok(finish)
}

async fn countdown(timer: &mut RestTimer<SystemClock>, listener: &mut SignalListener, refresh_millis: u64) -> Finish {
    let mut ticker = tokio::time::interval(StdDuration::from_millis(refresh_millis));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut display = Display::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if timer.refresh() == TimerState::Expired {
                    display.finish();
                    return Finish::Completed;
                }
                display.render(timer);
            }

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(command)) => {
                    let left = timer.remaining_secs();
                    if apply_command(timer, command.trim()) {
                        display.finish();
                        return Finish::Stopped(left);
                    }
                    display.render(timer);
                }
                Ok(None) => {
                    debug!("stdin closed; controls disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },

            Some(signal) = listener.recv() => match signal {
                ControlSignal::Suspend => {
                    timer.enter_background();
                    display.finish();
                    if let Err(e) = listener.suspend_process() {
                        warn!("Failed to suspend: {}", e);
                    }
                }
                ControlSignal::Resume => {
                    if timer.enter_foreground() == TimerState::Expired {
                        display.finish();
                        return Finish::Completed;
                    }
                    display.render(timer);
                }
                ControlSignal::Interrupt => {
                    info!("Interrupted");
                    let left = timer.remaining_secs();
                    timer.stop();
                    display.finish();
                    return Finish::Interrupted(left);
                }
            },
        }
    }
}

async fn log_events(mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(event) => debug!("Timer event: {:?}", event),
            Err(RecvError::Lagged(skipped)) => debug!("Missed {} timer events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Apply one line of keyboard input; returns true when the timer was stopped
fn apply_command<C: libironnotes::Clock>(timer: &mut RestTimer<C>, command: &str) -> bool {
    match command {
        "p" | "P" => timer.toggle(),
        "+" => timer.add_time(ADJUST_STEP_SECS),
        "-" => timer.subtract_time(ADJUST_STEP_SECS),
        "q" | "Q" => {
            timer.stop();
            return true;
        }
        "" => {}
        other => eprintln!("Unknown command '{}'. Use p, +, - or q", other),
    }
    false
}

/// Parse a rest duration; a bare number means seconds
fn parse_rest_duration(text: &str) -> Result<u32> {
    let text = text.trim();
    let secs = match text.parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => humantime::parse_duration(text)
            .map_err(|e| IronError::InvalidInput(format!("Invalid duration '{}': {}", text, e)))?
            .as_secs(),
    };

    if secs == 0 {
        return Err(IronError::InvalidInput("Rest duration must be at least one second".to_string()));
    }
    u32::try_from(secs).map_err(|_| IronError::InvalidInput(format!("Rest duration too long: {}", text)))
}

/// Single status line, redrawn only when its text changes
#[derive(Default)]
struct Display {
    last: Option<String>,
}

impl Display {
    fn render<C: libironnotes::Clock>(&mut self, timer: &RestTimer<C>) {
        let state = match timer.state() {
            TimerState::Paused => "  paused",
            _ => "",
        };
        let line = format!("{} / {}{}", timer.time_string(), format_clock(timer.total_secs()), state);
        if self.last.as_deref() == Some(line.as_str()) {
            return;
        }

        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\r{:<24}", line);
        let _ = stdout.flush();
        self.last = Some(line);
    }

    /// Leave the status line so the next output starts on a fresh one
    fn finish(&mut self) {
        if self.last.take().is_some() {
            println!();
        }
    }
}
