// This file is part of ammctl.
//
// ammctl is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// ammctl is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with ammctl.
// If not, see https://www.gnu.org/licenses/.


use std::io;

pub(crate) use tracing::*;
use tracing::{subscriber::Interest, Metadata, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, FmtSubscriber, Layer};

use super::LogsArgs;

/// Install the global subscriber. Logs are flushed when the returned guard drops.
pub(crate) fn configure_logging(config: &LogsArgs) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = log_writer(config.file.as_deref());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none());
    if config.json {
        let subscriber = builder.json().finish().with(QuietNetworkLayer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.compact().finish().with(QuietNetworkLayer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    // alloy's transports log through `log`
    LogTracer::init()?;

    Ok(guard)
}

fn log_writer(file: Option<&str>) -> (NonBlocking, WorkerGuard) {
    match file {
        Some(file) => tracing_appender::non_blocking(tracing_appender::rolling::never(".", file)),
        None => tracing_appender::non_blocking(io::stdout()),
    }
}

const NOISY_TARGETS: &[&str] = &["h2", "hyper", "alloy_transport_http"];

/// Drops per-request events from the HTTP stack
struct QuietNetworkLayer;

impl<S: Subscriber> Layer<S> for QuietNetworkLayer {
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        if is_noisy(metadata.target()) {
            Interest::never()
        } else {
            Interest::always()
        }
    }
}

fn is_noisy(target: &str) -> bool {
    NOISY_TARGETS.iter().any(|noisy| target.starts_with(noisy))
}
