use metrics_exporter_prometheus::PrometheusHandle;
use staff_directory::workflows::workspace::RunWorkspace;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Allows one crawl at a time.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunGate {
    active: Arc<AtomicBool>,
}

impl RunGate {
    pub(crate) fn try_acquire(&self) -> Option<RunPermit> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                active: self.active.clone(),
            })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Held for as long as a crawl runs; dropping it reopens the gate.
#[derive(Debug)]
pub(crate) struct RunPermit {
    active: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LaunchError {
    #[error("could not encode department list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not start crawler: {0}")]
    Io(#[from] io::Error),
}

/// Starts a crawl in the background and returns without waiting for it.
///
/// Implementations keep `permit` alive until the crawl has finished.
pub(crate) trait CrawlLauncher: Send + Sync {
    fn launch(&self, departments: Vec<String>, permit: RunPermit) -> Result<(), LaunchError>;
}

/// Runs the crawler as a child process of this binary with its output sent to
/// the run log.
#[derive(Debug, Clone)]
pub(crate) struct ProcessLauncher {
    program: PathBuf,
    log_file: PathBuf,
}

impl ProcessLauncher {
    pub(crate) fn current_exe(log_file: PathBuf) -> io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
            log_file,
        })
    }
}

impl CrawlLauncher for ProcessLauncher {
    fn launch(&self, departments: Vec<String>, permit: RunPermit) -> Result<(), LaunchError> {
        let payload = serde_json::to_string(&departments)?;
        let stdout = File::create(&self.log_file)?;
        let stderr = stdout.try_clone()?;

        let mut child = tokio::process::Command::new(&self.program)
            .arg("crawl")
            .arg("--departments")
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()?;

        info!(pid = child.id(), count = departments.len(), "crawler started");

        tokio::spawn(async move {
            let _permit = permit;
            match child.wait().await {
                Ok(status) if status.success() => info!(%status, "crawler finished"),
                Ok(status) => warn!(%status, "crawler exited with failure"),
                Err(err) => error!(error = %err, "could not wait for crawler"),
            }
        });

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// What the trigger endpoints do: start runs, report completion and hand out
/// the finished workbook.
pub(crate) struct RunService<L> {
    workspace: RunWorkspace,
    launcher: L,
    gate: RunGate,
}

impl<L: CrawlLauncher> RunService<L> {
    pub(crate) fn new(workspace: RunWorkspace, launcher: L) -> Self {
        Self {
            workspace,
            launcher,
            gate: RunGate::default(),
        }
    }

    pub(crate) fn workspace(&self) -> &RunWorkspace {
        &self.workspace
    }

    pub(crate) fn is_running(&self) -> bool {
        self.gate.is_active()
    }

    pub(crate) fn start(&self, departments: Vec<String>) -> Result<StartOutcome, LaunchError> {
        let Some(permit) = self.gate.try_acquire() else {
            warn!("crawl requested while another is running");
            return Ok(StartOutcome::AlreadyRunning);
        };

        self.workspace.prepare()?;
        self.launcher.launch(departments, permit)?;
        Ok(StartOutcome::Started)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.workspace.report_ready()
    }

    /// Read the finished workbook and clear the workspace. `None` when no
    /// workbook exists.
    pub(crate) fn take_report(&self) -> io::Result<Option<Vec<u8>>> {
        let path = self.workspace.report_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        if let Err(err) = self.workspace.purge() {
            warn!(error = %err, "cleanup after download failed");
        }
        Ok(Some(bytes))
    }
}
