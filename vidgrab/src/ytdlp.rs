use crate::{
    config::DownloadConfig,
    dependencies::{self, LIBRARY_MODULE},
    error::DownloadError,
    metadata::VideoMetadata,
    progress::{self, ProgressEvent, ProgressSink},
};
use log::debug;
use std::{
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
};

/// Prefix of the line printed after the final file has been moved in place.
const FILE_MARKER: &str = "[vidgrab-file]";

/// Operations the orchestrator needs from the download library.
pub trait MediaLibrary {
    /// Queries metadata without downloading any media bytes.
    fn extract_info(
        &self,
        url: &str,
        config: &DownloadConfig,
    ) -> Result<VideoMetadata, DownloadError>;

    /// Downloads `url` and returns the files written to disk.
    fn download(
        &self,
        url: &str,
        config: &DownloadConfig,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, DownloadError>;
}

/// The `yt_dlp` Python module run through an interpreter.
#[derive(Debug, Clone)]
pub struct YtDlp {
    python: String,
}

impl YtDlp {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    pub fn version(&self) -> Option<String> {
        dependencies::first_line_of(Path::new(&self.python), &["-m", LIBRARY_MODULE, "--version"])
    }

    fn command(&self, args: &[String]) -> Command {
        debug!(
            "Executing {} -m {} {}",
            self.python,
            LIBRARY_MODULE,
            args.iter()
                .map(|x| if x.contains(' ') {
                    format!("\"{x}\"")
                } else {
                    x.to_owned()
                })
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut command = Command::new(&self.python);
        command
            .env("PYTHONIOENCODING", "utf-8")
            .args(["-m", LIBRARY_MODULE])
            .args(args);
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> DownloadError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DownloadError::ToolNotFound(self.python.clone())
        } else {
            DownloadError::Io(e)
        }
    }
}

impl MediaLibrary for YtDlp {
    fn extract_info(
        &self,
        url: &str,
        config: &DownloadConfig,
    ) -> Result<VideoMetadata, DownloadError> {
        let output = self
            .command(&info_args(url, config))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(DownloadError::classify(&String::from_utf8_lossy(
                &output.stderr,
            )));
        }

        let meta = VideoMetadata::from_json(&output.stdout)
            .map_err(|e| DownloadError::Parse(e.to_string()))?;

        debug!(
            "Fetched info for {} (ext={})",
            meta.id.as_deref().unwrap_or("NA"),
            meta.ext.as_deref().unwrap_or("NA")
        );
        Ok(meta)
    }

    fn download(
        &self,
        url: &str,
        config: &DownloadConfig,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, DownloadError> {
        let mut child = self
            .command(&download_args(url, config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            reap(&mut child);
            return Err(DownloadError::Parse("child output was not captured".to_owned()));
        };

        // Drained separately so a chatty stderr cannot block the child.
        let stderr_reader = thread::spawn(move || {
            let mut buf = vec![];
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut files = vec![];
        let streamed = for_each_line(stdout, |line| {
            if let Some(event) = ProgressEvent::parse(line) {
                sink.on_event(&event);
            } else if let Some(path) = parse_file_line(line) {
                files.push(path);
            }
        });

        if let Err(e) = streamed {
            reap(&mut child);
            let _ = stderr_reader.join();
            return Err(e.into());
        }

        let status = child.wait()?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(DownloadError::classify(&stderr));
        }

        Ok(files)
    }
}

/// Calls `f` with every line of `reader`. Bytes that are not UTF-8 are replaced.
fn for_each_line(reader: impl Read, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = vec![];

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }

        f(String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']));
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub fn info_args(url: &str, config: &DownloadConfig) -> Vec<String> {
    let mut args = vec![
        "--dump-json".to_owned(),
        "--no-playlist".to_owned(),
        "--no-warnings".to_owned(),
        "-f".to_owned(),
        config.format.clone(),
    ];

    if config.no_check_certificate {
        args.push("--no-check-certificates".to_owned());
    }

    args.push(url.to_owned());
    args
}

pub fn download_args(url: &str, config: &DownloadConfig) -> Vec<String> {
    let mut args = vec![
        "-f".to_owned(),
        config.format.clone(),
        "-o".to_owned(),
        config.outtmpl.clone(),
        "--retries".to_owned(),
        config.retries.to_string(),
    ];

    if config.no_check_certificate {
        args.push("--no-check-certificates".to_owned());
    }

    args.extend_from_slice(&[
        "--no-playlist".to_owned(),
        "--newline".to_owned(),
        "--progress".to_owned(),
        "--progress-template".to_owned(),
        progress::progress_template(),
        "--print".to_owned(),
        format!("after_move:{} %(filepath)s", FILE_MARKER),
        // --print implies --simulate
        "--no-simulate".to_owned(),
        url.to_owned(),
    ]);

    args
}

fn parse_file_line(line: &str) -> Option<PathBuf> {
    let path = line.strip_prefix(FILE_MARKER)?.trim();

    if path.is_empty() || path == "NA" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
