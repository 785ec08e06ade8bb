use crate::error::LogError;
use crate::formatter::Formatter;
use crate::record::{validate_datefmt, LogRecord};
use serde::Serialize;
use serde_json::ser::Formatter as JsonFormatter;
use serde_json::{Map, Value as Json};
use std::io;

/// Keys every structured line starts with, in order.
pub const MANDATORY_KEYS: [&str; 4] = ["name", "level", "message", "time"];

/// Renders a record as a single-line JSON object.
///
/// Layout: `name`, `level`, `message`, `time`, then `msecs` when a date
/// layout is configured, then every record field. Fields never replace a key
/// that is already present. Non-ASCII text is emitted as `\uXXXX` escapes and
/// set-valued fields as sorted arrays, so identical input always produces
/// byte-identical output.
#[derive(Debug, Clone, Default)]
pub struct StructuredFormatter {
    datefmt: Option<String>,
}

impl StructuredFormatter {
    /// No date layout: `time` is empty and `msecs` is omitted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Result<Self, LogError> {
        let datefmt = datefmt.into();
        validate_datefmt(&datefmt)?;
        self.datefmt = Some(datefmt);
        Ok(self)
    }

    pub(crate) fn with_builtin_datefmt(mut self, datefmt: &str) -> Self {
        self.datefmt = Some(datefmt.to_string());
        self
    }

    pub fn datefmt(&self) -> Option<&str> {
        self.datefmt.as_deref()
    }

    /// Build the ordered object for `record`.
    pub fn to_object(&self, record: &LogRecord) -> Map<String, Json> {
        let mut object = Map::new();
        object.insert("name".into(), Json::String(record.logger_name.clone()));
        object.insert("level".into(), Json::String(record.level.name().to_string()));
        object.insert("message".into(), Json::String(record.message.clone()));
        match &self.datefmt {
            Some(datefmt) => {
                object.insert("time".into(), Json::String(record.format_time(datefmt)));
                object.insert("msecs".into(), Json::from(record.msecs()));
            }
            None => {
                object.insert("time".into(), Json::String(String::new()));
            }
        }
        for (key, value) in &record.fields {
            if !object.contains_key(key) {
                object.insert(key.clone(), value.to_json());
            }
        }
        object
    }
}

impl Formatter for StructuredFormatter {
    fn format(&self, record: &LogRecord) -> String {
        to_ascii_json(&Json::Object(self.to_object(record)))
    }
}

/// Serialize `value` on one line with `", "` / `": "` separators and every
/// non-ASCII character escaped.
pub fn to_ascii_json(value: &Json) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiLine);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        // Writing a `Value` into a `Vec` has no failure mode left; keep a
        // compact rendering as the last resort anyway.
        Err(_) => value.to_string(),
    }
}

struct AsciiLine;

impl JsonFormatter for AsciiLine {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
