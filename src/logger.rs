use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// RFC 3339 UTC timestamps on every log line.
struct Rfc3339;

impl FormatTime for Rfc3339 {
  fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
    write!(w, "{}", Utc::now().to_rfc3339())
  }
}

fn env_filter(level: &str) -> EnvFilter {
  EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber: stderr always, plus an append-only file
/// when `log_path` is set. `RUST_LOG` overrides `level`.
pub fn init(level: &str, log_path: Option<&Path>) -> anyhow::Result<()> {
  let stderr = fmt::layer()
    .with_timer(Rfc3339)
    .with_target(true)
    .with_writer(std::io::stderr);

  let file = match log_path {
    Some(path) => {
      let file = OpenOptions::new().create(true).append(true).open(path)?;
      Some(
        fmt::layer()
          .with_timer(Rfc3339)
          .with_ansi(false)
          .with_writer(Mutex::new(file)),
      )
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(env_filter(level))
    .with(stderr)
    .with(file)
    .try_init()?;
  Ok(())
}
