pub mod crawl;
mod harvest;
pub mod report;
pub mod workspace;

pub use harvest::{harvest, HarvestOutcome};
