use crate::{error::SetupError, ytdlp::YtDlp};
use colored::Colorize;
use log::{debug, info, warn};
use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

pub const LIBRARY_MODULE: &str = "yt_dlp";
pub const LIBRARY_PACKAGE: &str = "yt-dlp";

/// Whether the download library can be loaded right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryState {
    Available,
    NeedsInstall,
}

/// Loads and installs Python packages. Kept behind a trait so installs can be
/// faked in tests.
pub trait PackageManager {
    fn interpreter(&self) -> &str;
    fn has_module(&self, module: &str) -> bool;
    fn install(&self, package: &str) -> Result<(), SetupError>;
}

pub struct Pip {
    python: String,
}

impl Pip {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Uses the configured interpreter or the first one that answers `--version`.
    pub fn detect(configured: Option<&str>) -> Self {
        Self::new(configured.map_or_else(find_python, ToOwned::to_owned))
    }
}

impl PackageManager for Pip {
    fn interpreter(&self) -> &str {
        &self.python
    }

    fn has_module(&self, module: &str) -> bool {
        Command::new(&self.python)
            .args(["-c", &format!("import {}", module)])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|x| x.success())
    }

    fn install(&self, package: &str) -> Result<(), SetupError> {
        debug!("Executing {} -m pip install --upgrade {}", self.python, package);

        let output = Command::new(&self.python)
            .args(["-m", "pip", "install", "--upgrade", package])
            .output()
            .map_err(|source| SetupError::Spawn {
                program: self.python.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SetupError::Install {
                package: package.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(())
    }
}

pub fn library_state(pm: &dyn PackageManager) -> LibraryState {
    if pm.has_module(LIBRARY_MODULE) {
        LibraryState::Available
    } else {
        LibraryState::NeedsInstall
    }
}

/// Returns a handle to the download library, installing it first if needed.
pub fn ensure_download_library(pm: &dyn PackageManager) -> Result<YtDlp, SetupError> {
    match library_state(pm) {
        LibraryState::Available => {
            info!("{} yt-dlp is already installed", "✓".green());
        }
        LibraryState::NeedsInstall => {
            info!("Installing yt-dlp...");
            pm.install(LIBRARY_PACKAGE)?;

            if library_state(pm) == LibraryState::NeedsInstall {
                return Err(SetupError::Unavailable {
                    module: LIBRARY_MODULE.to_owned(),
                });
            }

            info!("{} yt-dlp installed successfully", "✓".green());
        }
    }

    Ok(YtDlp::new(pm.interpreter()))
}

/// True when ffmpeg is on `PATH` and answers `-version`.
pub fn detect_muxing_tool() -> bool {
    let Some(ffmpeg) = find_ffmpeg() else {
        warn!("ffmpeg not found (needed for high quality)");
        return false;
    };

    match Command::new(&ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {
            info!("{} ffmpeg is installed (high quality)", "✓".green());
            true
        }
        Ok(status) => {
            warn!(
                "ffmpeg at {} exited with code {}",
                ffmpeg.to_string_lossy(),
                status.code().unwrap_or(1)
            );
            false
        }
        Err(e) => {
            warn!("could not run ffmpeg: {}", e);
            false
        }
    }
}

pub fn find_ffmpeg() -> Option<PathBuf> {
    find_in_path(
        if cfg!(target_os = "windows") {
            "ffmpeg.exe"
        } else {
            "ffmpeg"
        },
        env::var_os("PATH")?.as_os_str(),
    )
}

fn find_in_path(bin: &str, path: &std::ffi::OsStr) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|x| x.join(bin))
        .find(|x| x.is_file())
}

fn find_python() -> String {
    let candidates = if cfg!(target_os = "windows") {
        ["python", "py", "python3"]
    } else {
        ["python3", "python", "/usr/local/bin/python3"]
    };

    candidates
        .iter()
        .find(|x| {
            Command::new(x)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|x| x.success())
        })
        .unwrap_or(&candidates[0])
        .to_string()
}

pub fn muxer_version() -> Option<String> {
    first_line_of(&find_ffmpeg()?, &["-version"])
}

pub(crate) fn first_line_of(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|x| x.trim().to_owned())
        .filter(|x| !x.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct FakePip {
        installed: Cell<bool>,
        install_works: bool,
        install_fixes: bool,
        installs: RefCell<Vec<String>>,
    }

    impl FakePip {
        fn new(installed: bool, install_works: bool, install_fixes: bool) -> Self {
            Self {
                installed: Cell::new(installed),
                install_works,
                install_fixes,
                installs: RefCell::new(vec![]),
            }
        }
    }

    impl PackageManager for FakePip {
        fn interpreter(&self) -> &str {
            "python-test"
        }

        fn has_module(&self, module: &str) -> bool {
            assert_eq!(module, "yt_dlp");
            self.installed.get()
        }

        fn install(&self, package: &str) -> Result<(), SetupError> {
            self.installs.borrow_mut().push(package.to_owned());

            if !self.install_works {
                return Err(SetupError::Install {
                    package: package.to_owned(),
                    stderr: "no network".to_owned(),
                });
            }

            if self.install_fixes {
                self.installed.set(true);
            }

            Ok(())
        }
    }

    #[test]
    fn available_library_skips_install() {
        let pm = FakePip::new(true, true, true);
        let lib = ensure_download_library(&pm).unwrap();

        assert_eq!(lib.python(), "python-test");
        assert!(pm.installs.borrow().is_empty());
    }

    #[test]
    fn missing_library_is_installed_then_reloaded() {
        let pm = FakePip::new(false, true, true);
        assert_eq!(library_state(&pm), LibraryState::NeedsInstall);

        ensure_download_library(&pm).unwrap();
        assert_eq!(*pm.installs.borrow(), ["yt-dlp"]);
        assert_eq!(library_state(&pm), LibraryState::Available);
    }

    #[test]
    fn failed_install_is_fatal() {
        let pm = FakePip::new(false, false, false);
        let e = ensure_download_library(&pm).unwrap_err();
        assert!(matches!(e, SetupError::Install { .. }));
        assert_eq!(e.to_string(), "installing yt-dlp failed: no network");
    }

    #[test]
    fn install_that_does_not_help_is_fatal() {
        let pm = FakePip::new(false, true, false);
        let e = ensure_download_library(&pm).unwrap_err();
        assert!(matches!(e, SetupError::Unavailable { .. }));
    }

    #[test]
    fn path_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ffmpeg"), b"").unwrap();
        let path = env::join_paths([PathBuf::from("/nonexistent"), dir.path().to_owned()]).unwrap();

        assert_eq!(
            find_in_path("ffmpeg", &path),
            Some(dir.path().join("ffmpeg"))
        );
        assert_eq!(find_in_path("ffprobe", &path), None);
    }
}
