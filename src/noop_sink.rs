use crate::sink::LogSink;
use std::io;

/// A sink that simply drops every line.
///
/// The default low-tier target when no file-like destination is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}
