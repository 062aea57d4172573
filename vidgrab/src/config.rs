use std::path::{Path, PathBuf};

/// Format expressions tried in order. The first one merges separate video
/// and audio tracks and therefore needs the muxing tool.
pub const QUALITY_LADDER: [&str; 3] = [
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]",
    "best[ext=mp4]",
    "best",
];

/// Format used when the muxing tool is missing.
pub const SINGLE_FILE_FORMAT: &str = "best[ext=mp4]";

pub const RETRIES: u32 = 10;

pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

pub fn combined_format() -> String {
    QUALITY_LADDER.join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub target_directory: PathBuf,
    pub prefer_high_quality: bool,
}

/// Options handed to the download library for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    pub format: String,
    pub outtmpl: String,
    pub retries: u32,
    /// Skip TLS certificate validation. Trades safety for compatibility
    /// with intercepting proxies and outdated certificate stores.
    pub no_check_certificate: bool,
}

impl DownloadConfig {
    pub fn new(directory: &Path) -> Self {
        Self {
            format: combined_format(),
            outtmpl: directory.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
            retries: RETRIES,
            no_check_certificate: true,
        }
    }

    pub fn for_request(request: &DownloadRequest) -> Self {
        let mut config = Self::new(&request.target_directory);

        if !request.prefer_high_quality {
            config.downgrade();
        }

        config
    }

    pub fn downgrade(&mut self) {
        self.format = SINGLE_FILE_FORMAT.to_owned();
    }

    pub fn is_combined(&self) -> bool {
        self.format.contains('+')
    }
}
