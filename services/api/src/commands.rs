use clap::Args;
use staff_directory::config::AppConfig;
use staff_directory::departments::SELECTABLE_DEPARTMENTS;
use staff_directory::error::AppError;
use staff_directory::telemetry::{self, LogSink};
use staff_directory::workflows::crawl::{CrawlError, WebDriverSession};
use staff_directory::workflows::harvest;
use staff_directory::workflows::report::consolidate;
use staff_directory::workflows::workspace::RunWorkspace;
use tracing::{error, info, warn};

#[derive(Args, Debug)]
pub(crate) struct CrawlArgs {
    /// JSON array of department names, e.g. '["Discovery Commons"]'
    #[arg(long, default_value = "[]")]
    pub(crate) departments: String,
}

/// A list that does not parse is treated as empty so the run still logs in
/// and consolidates what is already downloaded.
pub(crate) fn parse_departments(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(departments) => departments,
        Err(err) => {
            error!(error = %err, "department list is not a JSON array of strings; crawling none");
            Vec::new()
        }
    }
}

pub(crate) async fn run_crawl(args: CrawlArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::RunLog)?;

    let departments = parse_departments(&args.departments);
    let workspace = RunWorkspace::new(config.crawler.workspace.clone());
    let download_dir = workspace.absolute_download_dir()?;

    let session = WebDriverSession::launch(&config.crawler.webdriver_url, &download_dir)
        .await
        .map_err(CrawlError::from)?;
    let outcome = harvest(session, &config.crawler, &download_dir, departments).await?;

    match outcome.report {
        Some(report) => info!(
            path = %report.path.display(),
            rows = report.rows,
            departments = report.departments.len(),
            "staff report ready"
        ),
        None => warn!("no department exports could be read; no report written"),
    }
    Ok(())
}

pub(crate) fn run_consolidate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Console)?;

    let workspace = RunWorkspace::new(config.crawler.workspace);
    match consolidate(workspace.download_dir(), &workspace.report_path())? {
        Some(report) => {
            println!(
                "Wrote {} rows from {} departments to {}",
                report.rows,
                report.departments.len(),
                report.path.display()
            );
            for skipped in &report.skipped {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }
        None => println!(
            "No readable exports in {}; nothing written.",
            workspace.download_dir().display()
        ),
    }
    Ok(())
}

pub(crate) fn list_departments() {
    for department in SELECTABLE_DEPARTMENTS {
        println!("{department}");
    }
}
