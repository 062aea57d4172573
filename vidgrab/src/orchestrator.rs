use crate::{
    config::{DownloadConfig, DownloadRequest},
    console::{Console, Reply},
    error::{DownloadError, SetupError},
    metadata,
    progress::ProgressSink,
    toolchain::Toolchain,
    ytdlp::MediaLibrary,
};
use colored::Colorize;
use log::warn;
use std::path::{Path, PathBuf};

pub const CONFIRM_PROMPT: &str = "Download this video? (s/n)";

#[derive(Debug)]
pub enum DownloadOutcome {
    Completed {
        title: String,
        directory: PathBuf,
        /// Files as reported by the library, with their real extensions.
        files: Vec<PathBuf>,
    },
    Cancelled,
    /// Interrupt at the confirmation prompt.
    Interrupted,
    Failed(DownloadError),
}

impl DownloadOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn final_path(&self) -> Option<&Path> {
        match self {
            Self::Completed { files, .. } => files.last().map(PathBuf::as_path),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Failed(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// Runs one download request from URL to report.
pub struct Orchestrator<'a> {
    toolchain: &'a dyn Toolchain,
    console: &'a mut dyn Console,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        console: &'a mut dyn Console,
        sink: &'a mut dyn ProgressSink,
    ) -> Self {
        Self {
            toolchain,
            console,
            sink,
        }
    }

    /// Only a failure to provide the download library escapes as `Err`.
    /// Everything else ends up in the returned outcome, which is also printed.
    pub fn download(&mut self, url: &str) -> Result<DownloadOutcome, SetupError> {
        let library = self.toolchain.download_library()?;

        let outcome = self
            .run(library.as_ref(), url)
            .unwrap_or_else(DownloadOutcome::Failed);

        self.report(&outcome);
        Ok(outcome)
    }

    fn run(
        &mut self,
        library: &dyn MediaLibrary,
        url: &str,
    ) -> Result<DownloadOutcome, DownloadError> {
        let environment = self.toolchain.environment()?;

        let request = DownloadRequest {
            url: url.to_owned(),
            target_directory: environment.downloads_directory,
            prefer_high_quality: self.toolchain.muxer_available(),
        };

        let config = DownloadConfig::for_request(&request);

        if !config.is_combined() {
            warn!("ffmpeg not found, using single-file format {}", config.format);
        }

        self.console.say("\nFetching video information...");
        let meta = library.extract_info(&request.url, &config)?;

        self.console.say("");
        for line in metadata::format_metadata(&meta) {
            self.console.say(&line);
        }

        match self.console.ask(CONFIRM_PROMPT)? {
            Reply::Answer(x) if x.trim().eq_ignore_ascii_case("s") => (),
            Reply::Answer(_) => return Ok(DownloadOutcome::Cancelled),
            Reply::Interrupted => return Ok(DownloadOutcome::Interrupted),
        }

        self.console.say("\nStarting download...");
        let files = library.download(&request.url, &config, &mut *self.sink)?;

        Ok(DownloadOutcome::Completed {
            title: meta.display_title().to_owned(),
            directory: request.target_directory,
            files,
        })
    }

    fn report(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Completed {
                title,
                directory,
                files,
            } => {
                let names = files
                    .iter()
                    .filter_map(|x| x.file_name())
                    .map(|x| x.to_string_lossy().into_owned())
                    .collect::<Vec<_>>();

                let shown = if names.is_empty() {
                    title.to_owned()
                } else {
                    names.join(", ")
                };

                self.console.say(&format!(
                    "\n{} Download complete: {}",
                    "✓".green(),
                    shown
                ));
                if !names.is_empty() {
                    self.console.say(&format!("Title: {}", title));
                }
                self.console
                    .say(&format!("Location: {}", directory.to_string_lossy()));
            }
            DownloadOutcome::Cancelled => self.console.say("\nDownload cancelled"),
            DownloadOutcome::Interrupted => (),
            DownloadOutcome::Failed(e) => {
                self.console
                    .say(&format!("\n{} Error: {}", "✗".red(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::{EnvironmentInfo, OsKind},
        metadata::{VideoMetadata, ViewCount},
        progress::{Phase, ProgressEvent},
    };
    use std::{
        cell::RefCell,
        collections::VecDeque,
        io,
        rc::Rc,
        time::Duration,
    };

    #[derive(Default)]
    struct Calls {
        extract: Vec<DownloadConfig>,
        download: Vec<DownloadConfig>,
    }

    struct FakeLibrary {
        calls: Rc<RefCell<Calls>>,
        fail_download: bool,
    }

    impl MediaLibrary for FakeLibrary {
        fn extract_info(
            &self,
            _url: &str,
            config: &DownloadConfig,
        ) -> Result<VideoMetadata, DownloadError> {
            self.calls.borrow_mut().extract.push(config.clone());
            Ok(VideoMetadata {
                id: Some("abc123".to_owned()),
                title: Some("Test Clip".to_owned()),
                duration_seconds: 125,
                view_count: ViewCount::Count(1234567),
                resolution: Some("1920x1080".to_owned()),
                ext: Some("webm".to_owned()),
            })
        }

        fn download(
            &self,
            _url: &str,
            config: &DownloadConfig,
            sink: &mut dyn ProgressSink,
        ) -> Result<Vec<PathBuf>, DownloadError> {
            self.calls.borrow_mut().download.push(config.clone());

            if self.fail_download {
                return Err(DownloadError::Network("connection reset".to_owned()));
            }

            sink.on_event(&ProgressEvent {
                phase: Phase::Downloading,
                percent: Some(50.0),
                speed: Some(1024.0),
                eta_seconds: Some(3),
            });
            Ok(vec![PathBuf::from("/videos/Test Clip.webm")])
        }
    }

    struct FakeToolchain {
        calls: Rc<RefCell<Calls>>,
        muxer: bool,
        fail_download: bool,
        install_fails: bool,
    }

    impl FakeToolchain {
        fn new(muxer: bool) -> Self {
            Self {
                calls: Rc::default(),
                muxer,
                fail_download: false,
                install_fails: false,
            }
        }
    }

    impl Toolchain for FakeToolchain {
        fn download_library(&self) -> Result<Box<dyn MediaLibrary>, SetupError> {
            if self.install_fails {
                return Err(SetupError::Unavailable {
                    module: "yt_dlp".to_owned(),
                });
            }

            Ok(Box::new(FakeLibrary {
                calls: self.calls.clone(),
                fail_download: self.fail_download,
            }))
        }

        fn muxer_available(&self) -> bool {
            self.muxer
        }

        fn environment(&self) -> io::Result<EnvironmentInfo> {
            Ok(EnvironmentInfo {
                os: OsKind::Linux,
                downloads_directory: PathBuf::from("/videos"),
            })
        }

        fn interpreter(&self) -> String {
            "python3".to_owned()
        }

        fn library_version(&self) -> Option<String> {
            None
        }

        fn muxer_version(&self) -> Option<String> {
            None
        }
    }

    struct Script {
        inputs: VecDeque<Reply>,
        lines: Vec<String>,
    }

    impl Script {
        fn new(inputs: Vec<Reply>) -> Self {
            Self {
                inputs: inputs.into(),
                lines: vec![],
            }
        }
    }

    impl Console for Script {
        fn ask(&mut self, _message: &str) -> io::Result<Reply> {
            Ok(self.inputs.pop_front().unwrap_or(Reply::Interrupted))
        }

        fn say(&mut self, line: &str) {
            self.lines.push(line.to_owned());
        }

        fn clear(&mut self) {}

        fn pause(&mut self, _duration: Duration) {}
    }

    #[derive(Default)]
    struct Events(Vec<ProgressEvent>);

    impl ProgressSink for Events {
        fn on_event(&mut self, event: &ProgressEvent) {
            self.0.push(event.clone());
        }
    }

    fn answer(x: &str) -> Reply {
        Reply::Answer(x.to_owned())
    }

    fn run(toolchain: &FakeToolchain, inputs: Vec<Reply>) -> (DownloadOutcome, Script, Events) {
        colored::control::set_override(false);
        let mut console = Script::new(inputs);
        let mut events = Events::default();
        let outcome = Orchestrator::new(toolchain, &mut console, &mut events)
            .download("https://youtu.be/abc123")
            .unwrap();
        (outcome, console, events)
    }

    #[test]
    fn confirmed_download_completes() {
        let toolchain = FakeToolchain::new(true);
        let (outcome, console, events) = run(&toolchain, vec![answer("S")]);

        assert!(outcome.success());
        assert_eq!(outcome.final_path(), Some(Path::new("/videos/Test Clip.webm")));
        assert_eq!(outcome.error_message(), None);

        let calls = toolchain.calls.borrow();
        assert_eq!(calls.download.len(), 1);
        assert!(calls.download[0].outtmpl.starts_with("/videos"));
        assert_eq!(events.0.len(), 1);

        assert!(console.lines.contains(&"Title: Test Clip".to_owned()));
        assert!(console.lines.contains(&"Views: 1.234.567".to_owned()));
        assert!(console.lines.contains(&"\n✓ Download complete: Test Clip.webm".to_owned()));
        assert!(console.lines.contains(&"Location: /videos".to_owned()));
    }

    #[test]
    fn declined_confirmation_never_downloads() {
        for reply in ["n", "", "si", "yes"] {
            let toolchain = FakeToolchain::new(true);
            let (outcome, console, _) = run(&toolchain, vec![answer(reply)]);

            assert!(matches!(outcome, DownloadOutcome::Cancelled));
            assert!(!outcome.success());
            assert_eq!(toolchain.calls.borrow().extract.len(), 1);
            assert!(toolchain.calls.borrow().download.is_empty());
            assert_eq!(console.lines.last().unwrap(), "\nDownload cancelled");
        }
    }

    #[test]
    fn interrupt_at_confirmation() {
        let toolchain = FakeToolchain::new(true);
        let (outcome, _, _) = run(&toolchain, vec![Reply::Interrupted]);

        assert!(matches!(outcome, DownloadOutcome::Interrupted));
        assert!(toolchain.calls.borrow().download.is_empty());
    }

    #[test]
    fn missing_muxer_downgrades_format() {
        let toolchain = FakeToolchain::new(false);
        run(&toolchain, vec![answer("s")]);

        let calls = toolchain.calls.borrow();
        assert_eq!(calls.extract[0].format, "best[ext=mp4]");
        assert_eq!(calls.download[0].format, "best[ext=mp4]");
    }

    #[test]
    fn muxer_keeps_combined_format() {
        let toolchain = FakeToolchain::new(true);
        run(&toolchain, vec![answer("s")]);

        assert_eq!(
            toolchain.calls.borrow().download[0].format,
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
        );
    }

    #[test]
    fn download_error_becomes_failed_outcome() {
        let mut toolchain = FakeToolchain::new(true);
        toolchain.fail_download = true;
        let (outcome, console, _) = run(&toolchain, vec![answer("s")]);

        assert!(!outcome.success());
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("network error: connection reset")
        );
        assert_eq!(
            console.lines.last().unwrap(),
            "\n✗ Error: network error: connection reset"
        );
    }

    #[test]
    fn setup_error_escapes() {
        let mut toolchain = FakeToolchain::new(true);
        toolchain.install_fails = true;

        let mut console = Script::new(vec![]);
        let mut events = Events::default();
        let result = Orchestrator::new(&toolchain, &mut console, &mut events)
            .download("https://youtu.be/abc123");

        assert!(matches!(result, Err(SetupError::Unavailable { .. })));
        assert!(toolchain.calls.borrow().extract.is_empty());
    }
}
