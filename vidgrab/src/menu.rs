use crate::{
    console::{Console, Reply},
    environment::OsKind,
    error::{SetupError, UrlError},
    orchestrator::{DownloadOutcome, Orchestrator},
    progress::ProgressSink,
    toolchain::Toolchain,
};
use colored::Colorize;
use log::error;
use std::time::Duration;

pub const WIDTH: usize = 50;
pub const PLATFORM_DOMAINS: [&str; 2] = ["youtube.com", "youtu.be"];
pub const INVALID_CHOICE_PAUSE: Duration = Duration::from_secs(1);

pub const FAREWELL: &str = "Goodbye!";
pub const INTERRUPTED: &str = "Operation cancelled by user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Download,
    CheckDeps,
    ShowConfig,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Download),
            "2" => Some(Self::CheckDeps),
            "3" => Some(Self::ShowConfig),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Menu,
    Download,
    CheckDeps,
    ShowConfig,
    Exit,
    /// Interrupt at a prompt. Terminal, like `Exit`.
    Interrupted,
}

impl From<MenuChoice> for State {
    fn from(choice: MenuChoice) -> Self {
        match choice {
            MenuChoice::Download => Self::Download,
            MenuChoice::CheckDeps => Self::CheckDeps,
            MenuChoice::ShowConfig => Self::ShowConfig,
            MenuChoice::Exit => Self::Exit,
        }
    }
}

pub fn validate_url(url: &str) -> Result<(), UrlError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(UrlError::Scheme);
    }

    if !PLATFORM_DOMAINS.iter().any(|x| url.contains(x)) {
        return Err(UrlError::Platform);
    }

    Ok(())
}

/// The interactive menu loop.
pub struct App<T, C, S> {
    toolchain: T,
    console: C,
    sink: S,
}

impl<T: Toolchain, C: Console, S: ProgressSink> App<T, C, S> {
    pub fn new(toolchain: T, console: C, sink: S) -> Self {
        Self {
            toolchain,
            console,
            sink,
        }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Runs until the user exits or interrupts. Returns `Err` only when the
    /// download library cannot be installed.
    pub fn run(&mut self) -> Result<State, SetupError> {
        let mut state = State::Menu;

        loop {
            state = match state {
                State::Menu => self.menu(),
                State::Download => self.download()?,
                State::CheckDeps => self.check_dependencies()?,
                State::ShowConfig => self.show_config(),
                State::Exit => {
                    self.header();
                    self.console.say(&format!("\n{}", FAREWELL));
                    self.console
                        .say(&format!("\nThanks for using vidgrab v{}", env!("CARGO_PKG_VERSION")));
                    return Ok(state);
                }
                State::Interrupted => {
                    self.console.say(&format!("\n{}", INTERRUPTED));
                    return Ok(state);
                }
            };
        }
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        match self.console.ask(message) {
            Ok(Reply::Answer(x)) => Some(x),
            Ok(Reply::Interrupted) => None,
            Err(e) => {
                error!("could not read input: {}", e);
                None
            }
        }
    }

    /// Blocks on "Press Enter" and goes back to the menu.
    fn wait(&mut self) -> State {
        match self.prompt("\nPress Enter to continue...") {
            Some(_) => State::Menu,
            None => State::Interrupted,
        }
    }

    fn header(&mut self) {
        self.console.clear();
        self.console.say(&format!("\n{}", "=".repeat(WIDTH)));
        self.console
            .say(&format!("{:^WIDTH$}", "YouTube Video Downloader").bold().to_string());
        self.console.say(&format!(
            "{:^WIDTH$}",
            format!("Version {}", env!("CARGO_PKG_VERSION"))
        ));
        self.console.say(&format!("{}\n", "=".repeat(WIDTH)));
    }

    fn menu(&mut self) -> State {
        self.header();
        self.console.say(&format!("{:-^WIDTH$}", " MAIN MENU "));
        self.console.say("1. Download video");
        self.console.say("2. Check dependencies");
        self.console.say("3. Configuration");
        self.console.say("4. Exit");
        self.console.say(&format!("{}\n", "-".repeat(WIDTH)));

        let Some(input) = self.prompt("Select an option (1-4)") else {
            return State::Interrupted;
        };

        match MenuChoice::parse(&input) {
            Some(choice) => choice.into(),
            None => {
                self.console
                    .say(&format!("\n{}", "Invalid option. Please select 1-4.".yellow()));
                self.console.pause(INVALID_CHOICE_PAUSE);
                State::Menu
            }
        }
    }

    fn download(&mut self) -> Result<State, SetupError> {
        self.header();

        let Some(url) = self.prompt("\nEnter the YouTube URL") else {
            return Ok(State::Interrupted);
        };
        let url = url.trim();

        if let Err(e) = validate_url(url) {
            self.console.say(&format!("\n{} {}", "⚠".yellow(), e));
            return Ok(self.wait());
        }

        let outcome =
            Orchestrator::new(&self.toolchain, &mut self.console, &mut self.sink).download(url)?;

        if let DownloadOutcome::Interrupted = outcome {
            return Ok(State::Interrupted);
        }

        Ok(self.wait())
    }

    fn check_dependencies(&mut self) -> Result<State, SetupError> {
        self.header();
        self.console.say("\nChecking dependencies...\n");

        self.toolchain.download_library()?;
        self.toolchain.muxer_available();

        self.console.say("");
        self.console.say(&format!(
            "• yt-dlp version: {}",
            self.toolchain
                .library_version()
                .unwrap_or_else(|| "unknown".to_owned())
        ));
        self.console.say(&format!(
            "• ffmpeg: {}",
            self.toolchain
                .muxer_version()
                .unwrap_or_else(|| "not installed".to_owned())
        ));

        Ok(self.wait())
    }

    fn show_config(&mut self) -> State {
        self.header();
        self.console.say("\nCurrent configuration:\n");

        let android = match self.toolchain.environment() {
            Ok(env) => {
                self.console.say(&format!(
                    "• Downloads folder: {}",
                    env.downloads_directory.to_string_lossy()
                ));
                self.console.say(&format!("• System: {}", env.os));
                env.os == OsKind::AndroidSandbox
            }
            Err(e) => {
                self.console
                    .say(&format!("• Downloads folder: {} ({})", "unavailable".red(), e));
                false
            }
        };

        let muxer = self.toolchain.muxer_available();
        self.console
            .say(&format!("• ffmpeg installed: {}", yes_no(muxer)));
        self.console
            .say(&format!("• Android mode: {}", yes_no(android)));
        self.console
            .say(&format!("• Python interpreter: {}", self.toolchain.interpreter()));
        self.console.say(&format!(
            "• yt-dlp version: {}",
            self.toolchain
                .library_version()
                .unwrap_or_else(|| "not installed".to_owned())
        ));

        self.wait()
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}
