use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::WorkspaceConfig;

/// The files one run reads and writes: the download directory (exports plus the
/// final workbook) and the run log.
///
/// The workbook's presence doubles as the run's completion signal.
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    config: WorkspaceConfig,
}

impl RunWorkspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    pub fn download_dir(&self) -> &Path {
        &self.config.download_dir
    }

    pub fn log_file(&self) -> &Path {
        &self.config.log_file
    }

    pub fn report_name(&self) -> &str {
        &self.config.report_name
    }

    pub fn report_path(&self) -> PathBuf {
        self.config.report_path()
    }

    pub fn report_ready(&self) -> bool {
        self.report_path().is_file()
    }

    /// Get ready for a new run: start from an empty download directory and
    /// drop the previous log.
    ///
    /// Exports from earlier runs are removed too, so a workbook only ever holds
    /// departments downloaded by the run that wrote it.
    pub fn prepare(&self) -> io::Result<()> {
        self.reset_download_dir()?;
        remove_file_if_exists(self.log_file())?;
        Ok(())
    }

    /// Delete every artifact of the finished run, leaving an empty download
    /// directory behind.
    pub fn purge(&self) -> io::Result<()> {
        self.reset_download_dir()?;
        remove_file_if_exists(self.log_file())?;
        info!("cleaned up downloads and log");
        Ok(())
    }

    fn reset_download_dir(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(self.download_dir()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        std::fs::create_dir_all(self.download_dir())
    }

    /// The download directory as an absolute path, created if missing.
    pub fn absolute_download_dir(&self) -> io::Result<PathBuf> {
        std::fs::create_dir_all(self.download_dir())?;
        std::fs::canonicalize(self.download_dir())
    }
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
