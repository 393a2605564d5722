//! Shared setup for the Dropbox bridge command line tools.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging directive applied on top of `RUST_LOG`.
pub const DEFAULT_LOG_DIRECTIVE: &str = "dbx=info";

/// Whether `LOG_FORMAT` asks for JSON logs.
pub fn json_logs_requested(value: Option<&str>) -> bool {
    value.map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

/// Load `.env` and install the tracing subscriber.
///
/// Logs go to stderr so stdout stays clean for command output.
pub fn init() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let use_json = json_logs_requested(std::env::var("LOG_FORMAT").ok().as_deref());
    let env_filter = EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .try_init()?;
    }

    Ok(())
}
