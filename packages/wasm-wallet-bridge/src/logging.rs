//! Diagnostic logging.
//!
//! Native hosts get a `tracing-subscriber` formatter on stderr filtered by
//! `WALLET_BRIDGE_LOG`. In the browser the same formatter writes each line
//! to `console.log`.

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "WALLET_BRIDGE_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr subscriber. Does nothing if one is already installed.
pub fn init_logging() {
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// Install a subscriber that writes to the browser console.
pub fn init_console_logging() {
    let _ = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new("info"))
        .without_time()
        .with_ansi(false)
        .with_writer(ConsoleWriter::default)
        .try_init();
}

/// Buffers one formatted event and hands it to `console.log` on drop.
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&line.into());
        }
    }
}
