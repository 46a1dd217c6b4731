use clap::{ArgAction, Parser};
use clap::builder::BoolishValueParser;
use sluice::{Cadence, Config, Coordinator, Shutdown, TracingObserver};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Bounded-buffer producer/consumer run.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of producers
    #[arg(default_value_t = 5, allow_negative_numbers = true)]
    producers: i64,

    /// Number of consumers
    #[arg(default_value_t = 1, allow_negative_numbers = true)]
    consumers: i64,

    /// Buffer capacity
    #[arg(default_value_t = 5, allow_negative_numbers = true)]
    capacity: i64,

    /// Run time in seconds
    #[arg(default_value_t = 30, allow_negative_numbers = true)]
    run_secs: i64,

    /// Log every produced and consumed item
    #[arg(default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    verbose: bool,

    /// Upper bound of the random pause after each write, in milliseconds
    #[arg(long, default_value_t = 1000)]
    produce_delay_ms: u64,

    /// Upper bound of the random pause after each read, in milliseconds
    #[arg(long, default_value_t = 1500)]
    consume_delay_ms: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            producers: args.producers,
            consumers: args.consumers,
            capacity: args.capacity,
            run_duration_secs: args.run_secs,
            verbose: args.verbose,
            cadence: Cadence {
                produce_delay: Duration::from_millis(args.produce_delay_ms),
                consume_delay: Duration::from_millis(args.consume_delay_ms),
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from(Args::parse());
    sluice::trace::init_tracing(config.verbose);

    let coordinator = match Coordinator::new(&config, Arc::new(TracingObserver)) {
        Ok(coordinator) => coordinator,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let settings = coordinator.settings();
    info!(
        producers = settings.producers(),
        consumers = settings.consumers(),
        capacity = settings.capacity(),
        run_secs = settings.run_duration().as_secs(),
        "starting"
    );

    tokio::spawn(interrupt(coordinator.shutdown()));

    let report = coordinator.run().await;
    info!(
        produced = report.produced(),
        consumed = report.consumed(),
        remaining = report.remaining,
        "finished"
    );
    ExitCode::SUCCESS
}

/// Raises `shutdown` on SIGINT or, on Unix, SIGTERM.
async fn interrupt(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = shutdown.wait() => return,
    }

    if shutdown.trigger() {
        info!("interrupt received, shutting down");
    }
}
