//! Interactive console menu that downloads videos by driving the `yt_dlp`
//! Python module and, when present, `ffmpeg`.

pub mod config;
pub mod console;
pub mod dependencies;
pub mod environment;
pub mod error;
pub mod logger;
pub mod menu;
pub mod metadata;
pub mod orchestrator;
pub mod progress;
pub mod settings;
pub mod toolchain;
pub mod ytdlp;

pub use console::{Console, Reply, Terminal};
pub use error::{DownloadError, SetupError, UrlError};
pub use menu::{App, MenuChoice, State};
pub use orchestrator::{DownloadOutcome, Orchestrator};
pub use settings::Settings;
pub use toolchain::{System, Toolchain};
