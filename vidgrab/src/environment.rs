use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
};

const SANDBOX_MARKER: &str = "/data/data/com.termux/files/home";
const SANDBOX_CANDIDATES: [&str; 2] = ["/sdcard/Download", "/storage/emulated/0/Download"];
const SANDBOX_DEFAULT: &str = "/sdcard/Download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKind {
    Windows,
    Mac,
    Linux,
    AndroidSandbox,
}

impl OsKind {
    fn host() -> Self {
        match env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::Mac,
            _ => Self::Linux,
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "Windows",
            Self::Mac => "macOS",
            Self::Linux => "Linux",
            Self::AndroidSandbox => "Android (Termux)",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInfo {
    pub os: OsKind,
    pub downloads_directory: PathBuf,
}

/// Host facts the downloads directory is derived from.
#[derive(Debug, Clone)]
pub struct EnvironmentProbe {
    pub os: OsKind,
    pub home: Option<PathBuf>,
    pub user_profile: Option<PathBuf>,
    pub sandbox_marker: PathBuf,
    pub sandbox_candidates: [PathBuf; 2],
    pub sandbox_default: PathBuf,
}

impl EnvironmentProbe {
    pub fn host() -> Self {
        Self {
            os: OsKind::host(),
            home: dirs::home_dir(),
            user_profile: env::var_os("USERPROFILE").map(PathBuf::from),
            sandbox_marker: PathBuf::from(SANDBOX_MARKER),
            sandbox_candidates: SANDBOX_CANDIDATES.map(PathBuf::from),
            sandbox_default: PathBuf::from(SANDBOX_DEFAULT),
        }
    }

    pub fn is_android_sandbox(&self) -> bool {
        self.sandbox_marker.exists()
    }

    /// Resolves the downloads directory and creates it when missing.
    pub fn probe(&self) -> io::Result<EnvironmentInfo> {
        let (os, directory) = if self.is_android_sandbox() {
            let directory = self
                .sandbox_candidates
                .iter()
                .find(|x| x.exists())
                .unwrap_or(&self.sandbox_default)
                .to_owned();
            (OsKind::AndroidSandbox, directory)
        } else {
            (self.os, self.desktop_directory()?)
        };

        fs::create_dir_all(&directory)?;

        Ok(EnvironmentInfo {
            os,
            downloads_directory: directory,
        })
    }

    pub fn resolve_downloads_directory(&self) -> io::Result<PathBuf> {
        Ok(self.probe()?.downloads_directory)
    }

    fn desktop_directory(&self) -> io::Result<PathBuf> {
        match self.os {
            OsKind::Windows => {
                let base = self
                    .user_profile
                    .as_deref()
                    .or(self.home.as_deref())
                    .ok_or_else(no_home)?;
                Ok(base.join("Downloads"))
            }
            OsKind::Mac => Ok(self.home()?.join("Downloads")),
            OsKind::Linux | OsKind::AndroidSandbox => {
                let home = self.home()?;
                let localized = home.join("Descargas");

                if localized.exists() {
                    Ok(localized)
                } else {
                    Ok(home.join("Downloads"))
                }
            }
        }
    }

    fn home(&self) -> io::Result<&Path> {
        self.home.as_deref().ok_or_else(no_home)
    }
}

fn no_home() -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        "could not determine the home directory",
    )
}
