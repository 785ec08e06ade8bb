use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Synchronous destination for formatted log lines.
///
/// Implementations transport one already-formatted line to a concrete
/// target (stdout, a file, an in-memory buffer). Handlers call
/// `write_line` on the logging thread and return only after it does.
pub trait LogSink: Send + Sync {
    /// Write `line` followed by a single `\n` and flush.
    ///
    /// **Returns**
    /// - `Ok(())` once the line is visible to a reader of the target.
    /// - `Err(..)` if the target rejected the write or the flush. The
    ///   error reaches the caller of `log` unchanged.
    fn write_line(&self, line: &str) -> io::Result<()>;

    /// Flush any buffered bytes. Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

fn write_terminated(writer: &mut impl Write, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink lock poisoned"))
}

/// Writes to the process's standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        write_terminated(&mut io::stdout().lock(), line)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Writes to the process's standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        write_terminated(&mut io::stderr().lock(), line)
    }
}

/// Adapts any [`Write`] implementation into a sink.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Run `f` against the wrapped writer, e.g. to seek and read it back.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> io::Result<R> {
        Ok(f(&mut *lock(&self.writer)?))
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink lock poisoned"))
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        write_terminated(&mut *lock(&self.writer)?, line)
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.writer)?.flush()
    }
}

/// Append-mode file sink.
pub type FileSink = WriterSink<File>;

impl WriterSink<File> {
    /// Open (creating if needed) `path` for appending. Fails immediately if
    /// the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

/// In-memory sink with readback, for capturing output.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buffer = lock(&self.buffer)?;
        buffer.push_str(line);
        buffer.push('\n');
        Ok(())
    }
}
