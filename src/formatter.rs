use crate::error::LogError;
use crate::interpolate::Conversion;
use crate::record::{validate_datefmt, LogRecord};
use crate::structured::StructuredFormatter;

/// `name : LEVEL    message`, level padded to the widest level name.
pub const BASIC_FORMAT: &str = "%(name)s : %(levelname)-8s %(message)s";

/// Console layout with a fixed 12-column name gutter.
pub const CONSOLE_FORMAT: &str = "%(name)-12s: %(levelname)-8s %(message)s";

/// File layout: 24-column `date time.ms ` prefix, then the console columns.
pub const FIXED_FORMAT: &str = "%(asctime)s.%(msecs)-3d %(name)-12s %(levelname)-8s %(message)s";

pub const CSV_FORMAT: &str = "%(asctime)s.%(msecs)d,%(name)s,%(levelname)s,\"%(message)s\"";

/// Hand-rolled JSON line. Values are not escaped; use
/// [`StructuredFormatter`] when messages may contain quotes.
pub const JSON_FORMAT: &str =
    "{\"time\": \"%(asctime)s.%(msecs)d\", \"name\": \"%(name)s\", \"level\": \"%(levelname)s\", \"message\": \"%(message)s\"}";

pub const MESSAGE_FORMAT: &str = "%(message)s";

pub const DATEFMT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a [`LogRecord`] into one line of text, without the terminator.
///
/// Formatting never fails: anything that cannot be rendered as requested is
/// rendered as text instead.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> Formatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Attribute { key: String, conversion: Conversion },
}

/// Formatter driven by a `%(key)s` template.
///
/// Keys resolve against record attributes (`name`, `levelname`, `levelno`,
/// `message`, `asctime`, `msecs`, `created`) and then record fields. A key
/// found in neither renders as `None`. Malformed directives are kept as
/// literal text.
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    segments: Vec<Segment>,
    datefmt: Option<String>,
}

impl TemplateFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self { segments: parse_template(&template.into()), datefmt: None }
    }

    /// Set the strftime layout used for `%(asctime)s`.
    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Result<Self, LogError> {
        let datefmt = datefmt.into();
        validate_datefmt(&datefmt)?;
        self.datefmt = Some(datefmt);
        Ok(self)
    }

    pub fn datefmt(&self) -> Option<&str> {
        self.datefmt.as_deref()
    }

    // Built-in layouts are known to be valid.
    fn with_builtin_datefmt(mut self) -> Self {
        self.datefmt = Some(DATEFMT.to_string());
        self
    }
}

impl Formatter for TemplateFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Attribute { key, conversion } => match record.attribute(key, self.datefmt.as_deref()) {
                    Some(value) => {
                        let rendered = conversion
                            .render(&value)
                            .unwrap_or_else(|_| conversion.pad(value.to_string()));
                        out.push_str(&rendered);
                    }
                    None => out.push_str(&conversion.pad("None".to_string())),
                },
            }
        }
        out
    }
}

fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                literal.push('%');
                continue;
            }
            Some('(') => {}
            _ => {
                literal.push('%');
                continue;
            }
        }

        let mut lookahead = chars.clone();
        lookahead.next();
        let key: String = lookahead.by_ref().take_while(|&c| c != ')').collect();
        let parsed = if key.contains(['%', '(']) {
            None
        } else {
            Conversion::parse(&mut lookahead).ok()
        };
        match parsed {
            Some(conversion) => {
                chars = lookahead;
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Attribute { key, conversion });
            }
            None => literal.push('%'),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

pub fn basic_formatter() -> TemplateFormatter {
    TemplateFormatter::new(BASIC_FORMAT)
}

pub fn console_formatter() -> TemplateFormatter {
    TemplateFormatter::new(CONSOLE_FORMAT)
}

pub fn fixed_formatter() -> TemplateFormatter {
    TemplateFormatter::new(FIXED_FORMAT).with_builtin_datefmt()
}

pub fn csv_formatter() -> TemplateFormatter {
    TemplateFormatter::new(CSV_FORMAT).with_builtin_datefmt()
}

pub fn json_formatter() -> TemplateFormatter {
    TemplateFormatter::new(JSON_FORMAT).with_builtin_datefmt()
}

pub fn message_formatter() -> TemplateFormatter {
    TemplateFormatter::new(MESSAGE_FORMAT)
}

/// [`StructuredFormatter`] with the default date layout.
pub fn structured_formatter() -> StructuredFormatter {
    StructuredFormatter::new().with_builtin_datefmt(DATEFMT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, level: Severity, message: &str) -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2015, 1, 2, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(7);
        LogRecord::new(name, level, message, crate::fields! { "persist" => true, "user" => "ann" }).with_timestamp(ts)
    }

    #[test]
    fn test_basic_layout() {
        let line = basic_formatter().format(&record("app", Severity::Info, "hello"));
        assert_eq!(line, "app : INFO     hello");
    }

    #[test]
    fn test_console_layout_aligns_columns() {
        let f = console_formatter();
        assert_eq!(
            f.format(&record("myapp.base", Severity::Info, "first")),
            "myapp.base  : INFO     first"
        );
        assert_eq!(
            f.format(&record("myapp.area2", Severity::Critical, "second")),
            "myapp.area2 : CRITICAL second"
        );
    }

    #[test]
    fn test_fixed_layout_prefix_is_24_columns() {
        let line = fixed_formatter().format(&record("myapp.area1", Severity::Debug, "msg"));
        assert_eq!(line, "2015-01-02 03:04:05.7   myapp.area1  DEBUG    msg");
        assert_eq!(&line[24..], "myapp.area1  DEBUG    msg");
    }

    #[test]
    fn test_csv_and_json_templates() {
        let r = record("app", Severity::Error, "boom");
        assert_eq!(csv_formatter().format(&r), "2015-01-02 03:04:05.7,app,ERROR,\"boom\"");
        let parsed: serde_json::Value = serde_json::from_str(&json_formatter().format(&r)).unwrap();
        assert_eq!(parsed["time"], "2015-01-02 03:04:05.7");
        assert_eq!(parsed["level"], "ERROR");
    }

    #[test]
    fn test_custom_template_reads_fields_and_defaults_missing_to_none() {
        let f = TemplateFormatter::new(r#"{"user": "%(user)s", "persist": "%(persist)s", "additional": "%(additional)s"}"#);
        let line = f.format(&record("app", Severity::Debug, "m"));
        assert_eq!(line, r#"{"user": "ann", "persist": "true", "additional": "None"}"#);
    }

    #[test]
    fn test_type_mismatch_falls_back_to_text() {
        let f = TemplateFormatter::new("[%(user)5d] [%(missing)-6d]");
        assert_eq!(f.format(&record("app", Severity::Debug, "m")), "[  ann] [None  ]");
    }

    #[test]
    fn test_malformed_directives_stay_literal() {
        let f = TemplateFormatter::new("100% %(name)q %(name %(levelno)d");
        assert_eq!(f.format(&record("app", Severity::Warning, "m")), "100% %(name)q %(name 30");

        let f = TemplateFormatter::new("%% %(levelno)03d");
        assert_eq!(f.format(&record("app", Severity::Warning, "m")), "% 030");
    }

    #[test]
    fn test_datefmt_is_validated() {
        let f = TemplateFormatter::new("%(asctime)s").with_datefmt("%Y").unwrap();
        assert_eq!(f.format(&record("app", Severity::Info, "m")), "2015");
        assert!(TemplateFormatter::new("%(asctime)s").with_datefmt("%Q").is_err());
    }

    #[test]
    fn test_closure_formatter() {
        let f = |r: &LogRecord| format!("{}|{}", r.level, r.message);
        assert_eq!(Formatter::format(&f, &record("app", Severity::Info, "m")), "INFO|m");
    }
}
