//! Tracing setup

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "launchpadd=info,launchpad_deploy=info,launchpad_db=info,tower_http=info";

/// Default filter for a `-v` count; `RUST_LOG` always wins
pub fn default_filter(verbosity: u8) -> String {
    match verbosity {
        0 => DEFAULT_FILTER.to_string(),
        1 => "launchpadd=debug,launchpad_deploy=debug,launchpad_db=debug,launchpad_store=debug,launchpad_runtime=debug,tower_http=debug".to_string(),
        2 => "launchpadd=trace,launchpad_deploy=trace,launchpad_db=trace,launchpad_store=trace,launchpad_runtime=trace,launchpad_web=trace,tower_http=debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. With `log_dir`, logs are also written to a
/// daily rolling file; keep the returned guard alive to flush it.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity).into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "launchpadd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
