use std::io;
use thiserror::Error;

/// The mandatory download library could not be made available.
/// The only error that ends the process.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("installing {package} failed: {stderr}")]
    Install { package: String, stderr: String },

    #[error("{module} is still not importable after installation")]
    Unavailable { module: String },
}

/// A single download attempt failed. Printed and recovered by the menu.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("the platform blocked the request: {0}")]
    Blocked(String),

    #[error("video unavailable: {0}")]
    Unavailable(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("could not parse library output: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DownloadError {
    /// Maps the library's stderr to an error kind.
    pub fn classify(stderr: &str) -> Self {
        let message = last_error_line(stderr);
        let lower = stderr.to_lowercase();

        if lower.contains("http error 429")
            || lower.contains("sign in to confirm")
            || lower.contains("http error 403")
        {
            return Self::Blocked(message);
        }

        if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection reset")
            || lower.contains("name or service not known")
            || lower.contains("getaddrinfo failed")
            || lower.contains("unable to download webpage")
        {
            return Self::Network(message);
        }

        if lower.contains("video unavailable")
            || lower.contains("private video")
            || lower.contains("has been removed")
        {
            return Self::Unavailable(message);
        }

        if lower.contains("no module named") || lower.contains("command not found") {
            return Self::ToolNotFound(message);
        }

        Self::Extraction(message)
    }
}

fn last_error_line(stderr: &str) -> String {
    let lines = stderr
        .lines()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .collect::<Vec<_>>();

    lines
        .iter()
        .rev()
        .find(|x| x.starts_with("ERROR:"))
        .or(lines.last())
        .map(|x| x.trim_start_matches("ERROR:").trim().to_owned())
        .unwrap_or_else(|| "unknown error".to_owned())
}

/// Rejected URL input. The menu re-prompts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("enter a valid URL (must start with http:// or https://)")]
    Scheme,

    #[error("this does not look like a YouTube URL")]
    Platform,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rate_limit() {
        let e = DownloadError::classify("WARNING: foo\nERROR: [youtube] abc: HTTP Error 429: Too Many Requests");
        assert!(matches!(e, DownloadError::Blocked(ref m) if m.starts_with("[youtube] abc")));
    }

    #[test]
    fn classify_network() {
        let e = DownloadError::classify("ERROR: Unable to download webpage: <urlopen error timed out>");
        assert!(matches!(e, DownloadError::Network(_)));
    }

    #[test]
    fn classify_unavailable() {
        let e = DownloadError::classify("ERROR: [youtube] abc123: Video unavailable");
        assert_eq!(e.to_string(), "video unavailable: [youtube] abc123: Video unavailable");
    }

    #[test]
    fn classify_missing_module() {
        let e = DownloadError::classify("/usr/bin/python3: No module named yt_dlp");
        assert!(matches!(e, DownloadError::ToolNotFound(_)));
    }

    #[test]
    fn classify_falls_back_to_last_line() {
        let e = DownloadError::classify("something odd\n\nreally odd\n");
        assert_eq!(e.to_string(), "extraction failed: really odd");
    }

    #[test]
    fn classify_empty_stderr() {
        let e = DownloadError::classify("");
        assert_eq!(e.to_string(), "extraction failed: unknown error");
    }
}
