use crate::metadata;
use colored::Colorize;
use std::{
    fmt,
    io::{self, Write},
};

/// Prefix the library is told to put in front of every progress line.
pub const PROGRESS_MARKER: &str = "[vidgrab]";

/// Passed to `--progress-template`. Fields are separated by `|`,
/// missing values are rendered by the library as `NA`.
pub fn progress_template() -> String {
    format!(
        "download:{} %(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s",
        PROGRESS_MARKER
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Downloading,
    Finished,
    Error,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub percent: Option<f64>,
    /// Bytes per second.
    pub speed: Option<f64>,
    pub eta_seconds: Option<u64>,
}

impl ProgressEvent {
    /// Parses a line produced by [`progress_template`].
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(PROGRESS_MARKER)?.trim();
        let fields = rest.split('|').map(str::trim).collect::<Vec<_>>();

        if fields.len() != 6 {
            return None;
        }

        let phase = match fields[0] {
            "downloading" => Phase::Downloading,
            "finished" => Phase::Finished,
            "error" => Phase::Error,
            _ => Phase::Other,
        };

        let downloaded = number(fields[1]);
        let total = number(fields[2]).or(number(fields[3]));

        let percent = match (downloaded, total) {
            (Some(done), Some(total)) if total > 0.0 => Some((done / total * 100.0).min(100.0)),
            _ if phase == Phase::Finished => Some(100.0),
            _ => None,
        };

        Some(Self {
            phase,
            percent,
            speed: number(fields[4]),
            eta_seconds: number(fields[5]).map(|x| x as u64),
        })
    }
}

fn number(field: &str) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite() && *x >= 0.0)
}

/// Receives progress while the library downloads.
pub trait ProgressSink {
    fn on_event(&mut self, event: &ProgressEvent);
}

/// Overwrites the current terminal line on every downloading event.
pub struct TerminalSink<W: Write> {
    out: W,
    drawn: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, drawn: false }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, event: &ProgressEvent) -> io::Result<()> {
        write!(self.out, "\r\x1B[2K{}", render(event))?;
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }

    fn finish_line(&mut self) -> io::Result<()> {
        if self.drawn {
            writeln!(self.out)?;
            self.out.flush()?;
            self.drawn = false;
        }
        Ok(())
    }
}

impl<W: Write> ProgressSink for TerminalSink<W> {
    fn on_event(&mut self, event: &ProgressEvent) {
        // Rendering failures must not abort the transfer.
        let _ = match event.phase {
            Phase::Downloading => self.draw(event),
            Phase::Finished | Phase::Error => self.finish_line(),
            Phase::Other => Ok(()),
        };
    }
}

pub fn render(event: &ProgressEvent) -> String {
    let percent = event
        .percent
        .map_or_else(|| "?".to_owned(), |x| format!("{:.1}%", x));
    let speed = event
        .speed
        .map_or_else(|| "?".to_owned(), |x| format!("{}/s", ByteSize(x)));
    let eta = event
        .eta_seconds
        .map_or_else(|| "?".to_owned(), metadata::format_duration);

    format!(
        "Downloading: {} | Speed: {} | Time left: {}",
        percent.cyan(),
        speed.green(),
        eta.yellow()
    )
}

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Byte count in binary units, one decimal once past plain bytes.
pub struct ByteSize(pub f64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        let mut unit = 0;

        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            write!(f, "{}{}", value as u64, UNITS[0])
        } else {
            write!(f, "{:.1}{}", value, UNITS[unit])
        }
    }
}
