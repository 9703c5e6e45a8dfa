//! This program creates a message-only window and registers it for
//! keyboard HID interface arrivals. Whenever a new keyboard shows up
//! the interactive session is locked.
use hid_lock::{Config, Error};
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::default();

    // Enable logging, RUST_LOG wins over the built-in filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Watch until the sink is torn down
    if let Err(err) = watch(&config) {
        event!(Level::ERROR, "{err}");
        std::process::exit(err.exit_code() as i32);
    }
}

#[cfg(windows)]
fn watch(config: &Config) -> Result<(), Error> {
    hid_lock::win32::run(config)
}

#[cfg(not(windows))]
fn watch(_config: &Config) -> Result<(), Error> {
    Err(Error::Unsupported)
}
