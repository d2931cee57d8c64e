#![forbid(unsafe_code)]

//! `tracing` output routed to the browser console.
//!
//! Each event is formatted by `tracing-subscriber`'s fmt layer into a
//! [`ConsoleWriter`], which emits one console call per event when dropped.
//! The console method follows the event level so the devtools filters work.

use std::io;
use std::sync::Once;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;
use web_sys::console;

static INIT: Once = Once::new();

/// Install the console subscriber. Later calls are no-ops.
pub fn init_logging() {
    INIT.call_once(|| {
        let result = tracing_subscriber::fmt()
            .with_writer(ConsoleMakeWriter)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .try_init();
        if let Err(err) = result {
            console::warn_1(&JsValue::from_str(&format!(
                "sitewire: console logging unavailable: {err}"
            )));
        }
    });
}

/// [`MakeWriter`] producing one [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event.
#[derive(Debug)]
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::with_capacity(128),
        }
    }
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
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if line.is_empty() {
            return;
        }
        let msg = JsValue::from_str(line);
        match self.level {
            Level::ERROR => console::error_1(&msg),
            Level::WARN => console::warn_1(&msg),
            Level::INFO => console::info_1(&msg),
            Level::DEBUG => console::debug_1(&msg),
            Level::TRACE => console::log_1(&msg),
        }
    }
}
