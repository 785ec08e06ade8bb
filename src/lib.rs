//! Two-tier logging facade.
//!
//! A [`Facade`] owns a named root logger with a *low* tier handler (verbose,
//! usually a file) and a *high* tier handler (terse, usually the console).
//! Child loggers obtained from it reach both tiers through propagation, each
//! tier applying its own threshold and formatter. Records carry structured
//! fields, which the [`StructuredFormatter`] renders as one JSON object per
//! line.
//!
//! ```
//! use std::sync::Arc;
//! use tiered_log::{formatter, Facade, FacadeConfig, MemorySink, Registry};
//!
//! let file = Arc::new(MemorySink::new());
//! let console = Arc::new(MemorySink::new());
//! let config = FacadeConfig::new("myapp")
//!     .with_low_sink(file.clone())
//!     .with_low_formatter(formatter::fixed_formatter())
//!     .with_high_sink(console.clone());
//! let going = Facade::with_registry(config, Arc::new(Registry::new()));
//!
//! going.get_logger("area1").debug("Quick zephyrs blow, vexing daft Jim.", &[]).unwrap();
//! going.get_logger("area1").info("How quickly daft %s vex.", &["jumping zebras".into()]).unwrap();
//!
//! assert_eq!(file.lines().len(), 2);
//! assert_eq!(console.lines(), vec!["myapp.area1 : INFO     How quickly daft jumping zebras vex."]);
//! ```

pub mod env;
pub mod error;
pub mod facade;
pub mod formatter;
pub mod handler;
pub mod interpolate;
pub mod level;
pub mod logger;
pub mod noop_sink;
pub mod record;
pub mod registry;
pub mod sink;
pub mod structured;
pub mod value;

#[cfg(feature = "tracing-bridge")]
pub mod init;
#[cfg(feature = "tracing-bridge")]
pub mod layer;

pub use error::LogError;
pub use facade::{Facade, FacadeConfig, FacadeSettings};
pub use formatter::{Formatter, TemplateFormatter};
pub use handler::Handler;
pub use interpolate::InterpolationError;
pub use level::{Severity, UnknownSeverity};
pub use logger::Logger;
pub use noop_sink::NoopSink;
pub use record::LogRecord;
pub use registry::Registry;
pub use sink::{FileSink, LogSink, MemorySink, StderrSink, StdoutSink, WriterSink};
pub use structured::StructuredFormatter;
pub use value::{Fields, Value};
