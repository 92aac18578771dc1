use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::naming::export_file_name;
use super::session::{BrowserError, Locator, PortalSession};
use super::wait::{poll_until, WaitTimeout};
use crate::config::{PortalConfig, WaitConfig};

/// Why a single department produced no export.
#[derive(Debug, thiserror::Error)]
pub enum DepartmentError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("department field {locator} never appeared: {source}")]
    FieldUnavailable {
        locator: Locator,
        source: WaitTimeout,
    },
    #[error("export control {locator} never became clickable: {source}")]
    ExportUnavailable {
        locator: Locator,
        source: WaitTimeout,
    },
    #[error("download {} never appeared: {source}", .path.display())]
    DownloadTimedOut { path: PathBuf, source: WaitTimeout },
    #[error("could not {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

/// Runs the search-export-rename sequence for one department at a time.
///
/// Every export lands under the same default name, so calls must not overlap.
pub struct DepartmentDownloader<'a, S: ?Sized> {
    session: &'a S,
    portal: &'a PortalConfig,
    waits: WaitConfig,
    download_dir: &'a Path,
}

impl<'a, S> DepartmentDownloader<'a, S>
where
    S: PortalSession + ?Sized,
{
    pub fn new(
        session: &'a S,
        portal: &'a PortalConfig,
        waits: WaitConfig,
        download_dir: &'a Path,
    ) -> Self {
        Self {
            session,
            portal,
            waits,
            download_dir,
        }
    }

    fn default_download_path(&self) -> PathBuf {
        self.download_dir.join(&self.portal.default_download)
    }

    /// Search for `department`, export the results, and return the renamed CSV.
    pub async fn download(&self, department: &str) -> Result<PathBuf, DepartmentError> {
        let session = self.session;
        let field = &self.portal.department_field;
        let export = &self.portal.export_button;

        info!(department, "navigating to search page");
        session.open(&self.portal.search_url).await?;

        poll_until(self.waits.element(), move || async move {
            probe(session.is_present(field).await)
        })
        .await
        .map_err(|source| DepartmentError::FieldUnavailable {
            locator: field.clone(),
            source,
        })?;

        let default_path = self.default_download_path();
        remove_if_exists(&default_path).await?;

        info!(department, "searching");
        session.fill(field, department).await?;
        tokio::time::sleep(self.waits.typing_pause).await;
        // the portal searches on the key event, not on its Search button
        session.press_enter(field).await?;

        poll_until(self.waits.element(), move || async move {
            probe(session.is_clickable(export).await)
        })
        .await
        .map_err(|source| DepartmentError::ExportUnavailable {
            locator: export.clone(),
            source,
        })?;

        info!(department, "exporting results");
        session.click(export).await?;

        let watched = default_path.as_path();
        poll_until(self.waits.download(), move || async move {
            matches!(tokio::fs::try_exists(watched).await, Ok(true)).then_some(())
        })
        .await
        .map_err(|source| DepartmentError::DownloadTimedOut {
            path: default_path.clone(),
            source,
        })?;

        let target = self.download_dir.join(export_file_name(department));
        remove_if_exists(&target).await?;
        tokio::fs::rename(&default_path, &target)
            .await
            .map_err(|source| DepartmentError::Filesystem {
                action: "rename",
                path: default_path.clone(),
                source,
            })?;

        info!(department, file = %target.display(), "download complete");
        Ok(target)
    }
}

fn probe(result: Result<bool, BrowserError>) -> Option<()> {
    match result {
        Ok(found) => found.then_some(()),
        Err(err) => {
            debug!(error = %err, "element probe failed");
            None
        }
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), DepartmentError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DepartmentError::Filesystem {
            action: "remove",
            path: path.to_path_buf(),
            source,
        }),
    }
}
