use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Settings;

/// Route `tracing` output to the log file.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr. When the file cannot be opened logging stays off.
pub fn init(settings: &Settings) {
    let Some(file) = open_log_file(settings) else {
        return;
    };
    let filter = EnvFilter::try_from_env("WAVETUNE_LOG")
        .or_else(|_| EnvFilter::try_new(&settings.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn open_log_file(settings: &Settings) -> Option<File> {
    let path = settings.log_file()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
