//! Browser-driven crawl of the staff directory.
//!
//! One browser session, one department at a time: wait for the operator to sign
//! in, then search, export and rename per department. A department that fails
//! is logged and skipped; only a missed login aborts the crawl.

mod download;
mod login;
pub mod naming;
mod session;
mod wait;
mod webdriver;

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{PortalConfig, WaitConfig};

pub use download::{DepartmentDownloader, DepartmentError};
pub use login::{await_login, LoginState};
pub use session::{BrowserError, Locator, LocatorParseError, PortalSession};
pub use wait::{poll_until, WaitPolicy, WaitTimeout};
pub use webdriver::WebDriverSession;

/// Failures that end a crawl before any department is attempted.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("login not completed within {timeout:?}")]
    LoginTimedOut { timeout: Duration },
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentExport {
    pub department: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentFailure {
    pub department: String,
    pub reason: String,
}

/// What a finished crawl produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub exported: Vec<DepartmentExport>,
    pub failed: Vec<DepartmentFailure>,
}

impl CrawlSummary {
    pub fn failed_departments(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|failure| failure.department.as_str())
    }
}

pub struct DirectoryCrawler<S> {
    session: S,
    portal: PortalConfig,
    waits: WaitConfig,
    download_dir: PathBuf,
}

impl<S> DirectoryCrawler<S>
where
    S: PortalSession,
{
    pub fn new(
        session: S,
        portal: PortalConfig,
        waits: WaitConfig,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session,
            portal,
            waits,
            download_dir: download_dir.into(),
        }
    }

    /// Sign in, then export every department in order.
    ///
    /// The browser session is closed before returning, whatever the outcome.
    pub async fn run(&self, departments: &[String]) -> Result<CrawlSummary, CrawlError> {
        let outcome = self.crawl(departments).await;
        if let Err(err) = self.session.close().await {
            warn!(error = %err, "failed to close browser session");
        }
        outcome
    }

    async fn crawl(&self, departments: &[String]) -> Result<CrawlSummary, CrawlError> {
        match await_login(&self.session, &self.portal, self.waits.login()).await? {
            LoginState::Ready => {}
            _ => {
                error!(
                    timeout = ?self.waits.login_timeout,
                    "login timed out: the search page never loaded; aborting run"
                );
                return Err(CrawlError::LoginTimedOut {
                    timeout: self.waits.login_timeout,
                });
            }
        }

        info!(count = departments.len(), "starting department downloads");
        let downloader = DepartmentDownloader::new(
            &self.session,
            &self.portal,
            self.waits,
            &self.download_dir,
        );

        let mut summary = CrawlSummary::default();
        for department in departments {
            match downloader.download(department).await {
                Ok(path) => summary.exported.push(DepartmentExport {
                    department: department.clone(),
                    path,
                }),
                Err(err) => {
                    error!(
                        department = %department,
                        error = %err,
                        "department download failed; check the portal selectors if this persists"
                    );
                    summary.failed.push(DepartmentFailure {
                        department: department.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            exported = summary.exported.len(),
            failed = summary.failed.len(),
            failed_departments = ?summary.failed_departments().collect::<Vec<_>>(),
            "all downloads finished"
        );
        Ok(summary)
    }
}
