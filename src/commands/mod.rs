mod common;
mod export;
mod run;

pub use export::{ExportArgs, export_snapshot};
pub use run::{RunArgs, run_collection};
