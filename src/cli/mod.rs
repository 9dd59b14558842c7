pub mod console;
pub mod shutdown;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::run_console;
use shutdown::detect_shutdown;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    controller::Controller,
    tracker::activity::Activity,
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, default_export_path},
        logging::{enable_logging, LOG_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "activity-logger", version)]
#[command(about = "Stopwatch for tagging activity sessions and exporting them to CSV", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs into the console")]
    log: bool,
    #[arg(
        long = "log-filter",
        help = "Level of logs written. By default uses RUST_LOG or debug"
    )]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start an interactive logging session")]
    Run {
        #[arg(
            long,
            help = "Directory exports are written into. By default $HOME/ActivityLogger"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "List activities that can be selected")]
    Activities {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    let app_dir = create_application_default_path()?;
    enable_logging(LOG_PREFIX, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Run { dir } => {
            let dir = dir.map_or_else(default_export_path, Ok)?;
            info!("Exporting into {dir:?}");
            let controller = Controller::new(Arc::new(DefaultClock), dir);

            let shutdown_token = CancellationToken::new();
            let signals = tokio::spawn(detect_shutdown(shutdown_token.clone()));

            let result = run_console(
                controller,
                BufReader::new(tokio::io::stdin()),
                &mut io::stdout(),
                shutdown_token.clone(),
            )
            .await;

            shutdown_token.cancel();
            signals.await?;
            result
        }
        Commands::Activities {} => {
            for (index, activity) in Activity::SELECTABLE.iter().enumerate() {
                println!("{}\t{}\t{}", index + 1, activity.label(), activity.title());
            }
            Ok(())
        }
    }
}
