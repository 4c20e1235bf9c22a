use anyhow::{anyhow, Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    path::Path,
    sync::Mutex,
};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{
        self,
        writer::{MakeWriter, MakeWriterExt},
    },
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_FILE_NAME: &str = "prisonscraper.log";

/// Create `logs_dir` and open the log file there for appending.
pub fn open_log_file(logs_dir: &Path) -> Result<File> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("creating log directory {}", logs_dir.display()))?;
    let log_path = logs_dir.join(LOG_FILE_NAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))
}

/// fmt subscriber with the crate's filter; `RUST_LOG` overrides the default.
fn subscriber<W>(writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,prisonscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

/// Log to stderr and append to `<logs_dir>/prisonscraper.log`.
pub fn init(logs_dir: &Path) -> Result<()> {
    let file = open_log_file(logs_dir)?;
    subscriber(std::io::stderr.and(Mutex::new(file)))
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));
    Ok(())
}
