use crate::{
    dependencies::{self, PackageManager, Pip},
    environment::{EnvironmentInfo, EnvironmentProbe},
    error::SetupError,
    settings::Settings,
    ytdlp::{MediaLibrary, YtDlp},
};
use std::io;

/// External collaborators, re-queried on every use.
pub trait Toolchain {
    /// Loads the download library, installing it when missing.
    fn download_library(&self) -> Result<Box<dyn MediaLibrary>, SetupError>;
    fn muxer_available(&self) -> bool;
    fn environment(&self) -> io::Result<EnvironmentInfo>;
    fn interpreter(&self) -> String;
    fn library_version(&self) -> Option<String>;
    fn muxer_version(&self) -> Option<String>;
}

/// The host machine.
pub struct System {
    pip: Pip,
    probe: EnvironmentProbe,
}

impl System {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pip: Pip::detect(settings.python.as_deref()),
            probe: EnvironmentProbe::host(),
        }
    }
}

impl Toolchain for System {
    fn download_library(&self) -> Result<Box<dyn MediaLibrary>, SetupError> {
        Ok(Box::new(dependencies::ensure_download_library(&self.pip)?))
    }

    fn muxer_available(&self) -> bool {
        dependencies::detect_muxing_tool()
    }

    fn environment(&self) -> io::Result<EnvironmentInfo> {
        self.probe.probe()
    }

    fn interpreter(&self) -> String {
        self.pip.interpreter().to_owned()
    }

    fn library_version(&self) -> Option<String> {
        YtDlp::new(self.pip.interpreter()).version()
    }

    fn muxer_version(&self) -> Option<String> {
        dependencies::muxer_version()
    }
}
