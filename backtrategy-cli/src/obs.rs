use anyhow::{bail, Context, Result};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Install the global subscriber. `BACKTRATEGY_LOG` overrides `log_level`.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var("BACKTRATEGY_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter: {filter}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
    if let Err(err) = installed {
        bail!("failed to install tracing subscriber: {err}");
    }
    Ok(())
}
