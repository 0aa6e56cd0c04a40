// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wmonkey_controller::{DispatcherConfig, ScriptSource, StdoutSink};

use crate::config::Config;

/// Install the global tracing subscriber.
///
/// Priority: `--log-level` / `QTMONKEY_LOG_LEVEL` > `RUST_LOG` > "info".
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = if std::env::var("QTMONKEY_LOG_LEVEL").is_err() && config.log_level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Read every `--script` file and run one controller session to completion.
pub async fn run(config: Config) -> anyhow::Result<i32> {
    init_tracing(&config);

    let mut initial_scripts = Vec::with_capacity(config.scripts.len());
    for path in &config.scripts {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read script {}: {e}", path.display()))?;
        initial_scripts.push(ScriptSource { file: path.display().to_string(), contents });
    }

    let dispatcher_config = DispatcherConfig {
        user_app: config.user_app.clone(),
        user_app_args: config.user_app_args.clone(),
        initial_scripts,
        exit_on_script_error: config.exit_on_script_error,
        wait_before_exit: Duration::from_millis(config.wait_before_exit_ms),
        port_override: config.port,
        screenshot_dir: config.screenshot_dir.clone(),
        screenshot_retain: config.screenshot_retain,
    };

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let mut sink = StdoutSink;
    let code = wmonkey_controller::run(dispatcher_config, cancel, &mut sink).await?;
    info!("controller session finished with exit code {code}");
    Ok(code)
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
            }
            _ = cancel.cancelled() => {
                return;
            }
        }
        cancel.cancel();
    });
}

pub fn log_fatal(e: &anyhow::Error) {
    error!("fatal: {e:#}");
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
