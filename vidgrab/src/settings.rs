use log::LevelFilter;
use std::{
    env,
    io::{IsTerminal, stdin},
};

pub const PYTHON_ENV: &str = "VIDGRAB_PYTHON";
pub const RAW_PROMPTS_ENV: &str = "VIDGRAB_RAW_PROMPTS";
pub const LOG_ENV: &str = "VIDGRAB_LOG";

/// Process-wide knobs read from the environment on startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Interpreter used to run the `yt_dlp` module. Detected when unset.
    pub python: Option<String>,
    /// Plain stdin prompts for old terminals and piped input.
    pub raw_prompts: bool,
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python: None,
            raw_prompts: false,
            log_level: LevelFilter::Info,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), stdin().is_terminal())
    }

    fn from_lookup<F>(lookup: F, interactive: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let python = lookup(PYTHON_ENV)
            .map(|x| x.trim().to_owned())
            .filter(|x| !x.is_empty());

        let raw_prompts = !interactive || lookup(RAW_PROMPTS_ENV).is_some_and(|x| truthy(&x));

        let log_level = lookup(LOG_ENV)
            .and_then(|x| x.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);

        Self {
            python,
            raw_prompts,
            log_level,
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
