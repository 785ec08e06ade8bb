use crate::error::LogError;
use crate::formatter::{self, Formatter};
use crate::level::Severity;
use crate::noop_sink::NoopSink;
use crate::record::LogRecord;
use crate::sink::{FileSink, LogSink, MemorySink, StderrSink, StdoutSink, WriterSink};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// A thresholded, formatted sink.
///
/// Admits a record when its level is at or above `threshold` and, if a
/// ceiling is set, strictly below the ceiling.
///
/// A handler that claims its sink owns that sink for every record it
/// admits: handlers reached later in the same dispatch that write to the
/// same sink skip the record.
#[derive(Clone)]
pub struct Handler {
    threshold: Severity,
    ceiling: Option<Severity>,
    claims_sink: bool,
    formatter: Arc<dyn Formatter>,
    sink: Arc<dyn LogSink>,
}

impl Handler {
    pub fn new(sink: Arc<dyn LogSink>, formatter: Arc<dyn Formatter>, threshold: Severity) -> Self {
        Self { threshold, ceiling: None, claims_sink: false, formatter, sink }
    }

    /// Reject records at or above `ceiling`.
    pub fn with_ceiling(mut self, ceiling: Severity) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Keep later handlers off this sink for records this handler admits.
    pub fn claiming_sink(mut self) -> Self {
        self.claims_sink = true;
        self
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn claims_sink(&self) -> bool {
        self.claims_sink
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Whether both handlers write to the same sink instance.
    pub fn shares_sink(&self, sink: &Arc<dyn LogSink>) -> bool {
        Arc::ptr_eq(&self.sink, sink)
    }

    pub fn admits(&self, level: Severity) -> bool {
        level.admitted_by(self.threshold) && self.ceiling.map_or(true, |ceiling| level < ceiling)
    }

    /// Format and write `record` if admitted; otherwise do nothing.
    ///
    /// The line is flushed before returning. Write failures are returned
    /// as-is, without retry.
    pub fn handle(&self, record: &LogRecord) -> Result<(), LogError> {
        if !self.admits(record.level) {
            return Ok(());
        }
        let line = self.formatter.format(record);
        if let Err(e) = self.sink.write_line(&line) {
            tracing::warn!(logger = %record.logger_name, error = %e, "log sink write failed");
            return Err(e.into());
        }
        Ok(())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("threshold", &self.threshold)
            .field("ceiling", &self.ceiling)
            .field("claims_sink", &self.claims_sink)
            .finish_non_exhaustive()
    }
}

/// Standard-output handler with the console layout at `INFO`.
pub fn stdout_handler() -> Handler {
    Handler::new(Arc::new(StdoutSink), Arc::new(formatter::console_formatter()), Severity::Info)
}

/// Standard-error handler with the console layout at `INFO`.
pub fn stderr_handler() -> Handler {
    Handler::new(Arc::new(StderrSink), Arc::new(formatter::console_formatter()), Severity::Info)
}

/// Discards everything.
pub fn null_handler() -> Handler {
    Handler::new(Arc::new(NoopSink), Arc::new(formatter::basic_formatter()), Severity::Debug)
}

/// Handler over any writer, basic layout at `DEBUG`.
pub fn writer_handler<W: Write + Send + 'static>(writer: W) -> Handler {
    Handler::new(Arc::new(WriterSink::new(writer)), Arc::new(formatter::basic_formatter()), Severity::Debug)
}

/// Append-mode file handler, fixed layout at `DEBUG`.
pub fn file_handler(path: impl AsRef<Path>) -> Result<Handler, LogError> {
    let sink = FileSink::open(path)?;
    Ok(Handler::new(Arc::new(sink), Arc::new(formatter::fixed_formatter()), Severity::Debug))
}

/// Capturing handler plus the buffer it writes into.
pub fn memory_handler(threshold: Severity) -> (Handler, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let handler = Handler::new(sink.clone(), Arc::new(formatter::message_formatter()), threshold);
    (handler, sink)
}
