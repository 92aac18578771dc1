use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::crawl::{naming::dedupe_departments, CrawlSummary, DirectoryCrawler, PortalSession};
use super::report::{consolidate, ReportSummary};
use crate::config::CrawlerConfig;
use crate::error::AppError;

/// Result of a full run: the crawl's per-department outcome and the workbook,
/// if one could be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestOutcome {
    pub crawl: CrawlSummary,
    pub report: Option<ReportSummary>,
}

/// Crawl the requested departments, then merge whatever exports are in
/// `download_dir` into the staff report.
///
/// `download_dir` must be the directory the browser saves into. A login
/// timeout returns early and skips consolidation.
pub async fn harvest<S, I>(
    session: S,
    config: &CrawlerConfig,
    download_dir: &Path,
    requested: I,
) -> Result<HarvestOutcome, AppError>
where
    S: PortalSession,
    I: IntoIterator,
    I::Item: Into<String>,
{
    let departments = dedupe_departments(requested);
    info!(count = departments.len(), "starting the directory crawler");

    let crawler = DirectoryCrawler::new(
        session,
        config.portal.clone(),
        config.waits,
        download_dir,
    );
    let crawl = crawler.run(&departments).await?;

    let report_path = download_dir.join(&config.workspace.report_name);
    let report = consolidate(download_dir, &report_path)?;

    Ok(HarvestOutcome { crawl, report })
}
