//! Logging setup.
//!
//! All modules log through `tracing`. In the browser the formatted events are
//! forwarded to the developer console; natively (tests, tooling) they go to
//! stdout.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_arch = "wasm32")]
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(console::ConsoleWriter::default)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .try_init();

    #[cfg(not(target_arch = "wasm32"))]
    let result = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;
    use wasm_bindgen::JsValue;

    /// Buffers one formatted event and hands it to `console.log` on drop.
    #[derive(Default)]
    pub(super) struct ConsoleWriter {
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            if self.buf.is_empty() {
                return;
            }
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
        }
    }
}
