use crate::commands::{list_departments, run_consolidate, run_crawl, CrawlArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use staff_directory::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "staff-directory",
    about = "Export university staff directory listings by department and merge them into one workbook",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP trigger service (default command)
    Serve(ServeArgs),
    /// Log in, export every requested department and build the report
    Crawl(CrawlArgs),
    /// Merge the CSV exports already in the download directory
    Consolidate,
    /// Print the departments offered on the start page
    Departments,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Crawl(args) => run_crawl(args).await,
        Command::Consolidate => run_consolidate(),
        Command::Departments => {
            list_departments();
            Ok(())
        }
    }
}
