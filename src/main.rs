use activity_logger::{cli::run_cli, utils::runtime::run_single_threaded};
use anyhow::Result;
use tracing::error;

fn main() -> Result<()> {
    run_single_threaded(run_cli())?.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })
}
