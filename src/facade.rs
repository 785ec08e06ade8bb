use crate::env;
use crate::error::LogError;
use crate::formatter::{self, Formatter};
use crate::handler::Handler;
use crate::level::Severity;
use crate::logger::Logger;
use crate::noop_sink::NoopSink;
use crate::registry::{HandlerScope, LoggerNode, Registry};
use crate::sink::{LogSink, StdoutSink};
use crate::value::{Fields, Value};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Root name used when none is configured.
pub const DEFAULT_NAME: &str = "root";

/// Child name of the logger returned by [`Facade::logger`].
pub const BASE_LOGGER: &str = "base";

/// Complete facade configuration.
///
/// **Defaults**
/// - low tier: `DEBUG` threshold, [`NoopSink`], basic layout.
/// - high tier: `INFO` threshold, [`StdoutSink`], console layout.
/// - `verbose`: `None` keeps `high_level`; `Some(true)` lowers it to
///   `DEBUG`; `Some(false)` raises it to `CRITICAL`.
/// - `monolog`: when `true` the low tier rejects anything the high tier
///   admits, so each record is written once.
#[derive(Clone)]
pub struct FacadeConfig {
    pub name: String,
    pub low_level: Severity,
    pub low_sink: Arc<dyn LogSink>,
    pub low_formatter: Arc<dyn Formatter>,
    pub high_level: Severity,
    pub high_sink: Arc<dyn LogSink>,
    pub high_formatter: Arc<dyn Formatter>,
    pub verbose: Option<bool>,
    pub monolog: bool,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            low_level: Severity::Debug,
            low_sink: Arc::new(NoopSink),
            low_formatter: Arc::new(formatter::basic_formatter()),
            high_level: Severity::Info,
            high_sink: Arc::new(StdoutSink),
            high_formatter: Arc::new(formatter::console_formatter()),
            verbose: None,
            monolog: false,
        }
    }
}

impl FacadeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_low_level(mut self, level: Severity) -> Self {
        self.low_level = level;
        self
    }

    pub fn with_low_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.low_sink = sink;
        self
    }

    pub fn with_low_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.low_formatter = Arc::new(formatter);
        self
    }

    pub fn with_high_level(mut self, level: Severity) -> Self {
        self.high_level = level;
        self
    }

    pub fn with_high_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.high_sink = sink;
        self
    }

    pub fn with_high_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.high_formatter = Arc::new(formatter);
        self
    }

    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_monolog(mut self, monolog: bool) -> Self {
        self.monolog = monolog;
        self
    }

    /// Defaults overridden by whatever `settings` specifies.
    pub fn from_settings(settings: FacadeSettings) -> Self {
        let mut config = Self::default();
        config.apply(settings);
        config
    }

    /// Overlay `settings` onto this configuration.
    pub fn apply(&mut self, settings: FacadeSettings) {
        if let Some(name) = settings.name {
            self.name = name;
        }
        if let Some(level) = settings.low_level {
            self.low_level = level;
        }
        if let Some(level) = settings.high_level {
            self.high_level = level;
        }
        if settings.verbose.is_some() {
            self.verbose = settings.verbose;
        }
        if let Some(monolog) = settings.monolog {
            self.monolog = monolog;
        }
    }

    /// Defaults overridden from the process environment (see [`env`]).
    pub fn from_env() -> Result<Self, LogError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LogError> {
        Ok(Self::from_settings(FacadeSettings::from_lookup(lookup)?))
    }

    /// High-tier threshold after applying `verbose`.
    pub fn effective_high_level(&self) -> Severity {
        match self.verbose {
            Some(true) => Severity::Debug,
            Some(false) => Severity::Critical,
            None => self.high_level,
        }
    }
}

impl fmt::Debug for FacadeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeConfig")
            .field("name", &self.name)
            .field("low_level", &self.low_level)
            .field("high_level", &self.high_level)
            .field("verbose", &self.verbose)
            .field("monolog", &self.monolog)
            .finish_non_exhaustive()
    }
}

/// The textual subset of [`FacadeConfig`], loadable from config files.
///
/// Level names are case-insensitive; unknown names fail deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacadeSettings {
    pub name: Option<String>,
    pub low_level: Option<Severity>,
    pub high_level: Option<Severity>,
    pub verbose: Option<bool>,
    pub monolog: Option<bool>,
}

impl FacadeSettings {
    /// Read settings from variables named in [`env`]. Unset variables are
    /// left as `None`; malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LogError> {
        let level = |key: &str| -> Result<Option<Severity>, LogError> {
            lookup(key).map(|v| v.parse::<Severity>()).transpose().map_err(LogError::from)
        };
        let flag = |key: &str| -> Result<Option<bool>, LogError> {
            lookup(key)
                .map(|v| {
                    env::parse_flag(&v).ok_or_else(|| LogError::InvalidSetting { key: key.to_string(), value: v })
                })
                .transpose()
        };
        Ok(Self {
            name: lookup(env::NAME_ENV).filter(|n| !n.trim().is_empty()),
            low_level: level(env::LOW_LEVEL_ENV)?,
            high_level: level(env::HIGH_LEVEL_ENV)?,
            verbose: flag(env::VERBOSE_ENV)?,
            monolog: flag(env::MONOLOG_ENV)?,
        })
    }
}

/// Entry point: a named root with a low and a high tier handler, and a
/// factory for child loggers that reach both through propagation.
///
/// Node names live in a shared [`Registry`]; the tier handlers belong to
/// this facade alone. Two facades with the same name share nodes but never
/// each other's handlers, so building a facade twice cannot double-emit.
#[derive(Clone)]
pub struct Facade {
    name: String,
    registry: Arc<Registry>,
    scope: Arc<HandlerScope>,
    root: Arc<LoggerNode>,
    high_sink: Arc<dyn LogSink>,
    low_level: Severity,
}

impl Facade {
    /// Default configuration under `name`, on the global registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(FacadeConfig::new(name))
    }

    pub fn with_config(config: FacadeConfig) -> Self {
        Self::with_registry(config, Registry::global())
    }

    pub fn with_registry(config: FacadeConfig, registry: Arc<Registry>) -> Self {
        let root = registry.node(&config.name);
        let scope = Arc::new(HandlerScope::new());
        let high_level = config.effective_high_level();

        let mut low = Handler::new(config.low_sink.clone(), config.low_formatter.clone(), config.low_level);
        if config.monolog {
            low = low.with_ceiling(high_level);
        }
        let high = Handler::new(config.high_sink.clone(), config.high_formatter.clone(), high_level);
        scope.attach(root.name(), low);
        scope.attach(root.name(), high);

        tracing::debug!(
            name = root.name(),
            scope = scope.id(),
            low_level = %config.low_level,
            high_level = %high_level,
            monolog = config.monolog,
            "attached tier handlers"
        );

        Self {
            name: root.name().to_string(),
            registry,
            scope,
            root,
            high_sink: config.high_sink,
            low_level: config.low_level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default logger, `<name>.base`.
    pub fn logger(&self) -> Logger {
        self.get_logger(BASE_LOGGER)
    }

    /// The node carrying the tier handlers, `<name>` itself.
    pub fn root_logger(&self) -> Logger {
        Logger::from_node(self.root.clone(), Some(self.scope.clone()))
    }

    /// Logger `<name>.<child>`; an empty `child` means [`BASE_LOGGER`].
    pub fn get_logger(&self, child: &str) -> Logger {
        let child = if child.trim().is_empty() { BASE_LOGGER } else { child };
        let node = self.registry.node(&format!("{}.{}", self.name, child));
        Logger::from_node(node, Some(self.scope.clone()))
    }

    /// Like [`get_logger`](Self::get_logger), plus a dedicated handler that
    /// writes [`StructuredFormatter`](crate::StructuredFormatter) lines to the
    /// high-tier sink at the low-tier threshold. That handler claims the
    /// sink, so the high tier's own layout never lands between JSON lines.
    ///
    /// With `persist`, every record carries `persist: true` unless a call
    /// overrides it. `extra` is bound the same way. Repeated calls for the
    /// same child attach the dedicated handler only once.
    pub fn get_structured_logger(&self, child: &str, persist: bool, extra: Fields) -> Logger {
        let logger = self.get_logger(child);
        self.scope.attach_once(logger.name(), "structured", || {
            Handler::new(
                self.high_sink.clone(),
                Arc::new(crate::structured::StructuredFormatter::new()),
                self.low_level,
            )
            .claiming_sink()
        });

        let mut bound = extra;
        if persist {
            bound.insert("persist".to_string(), Value::Bool(true));
        }
        if bound.is_empty() {
            logger
        } else {
            logger.bind(bound)
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl fmt::Debug for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("name", &self.name)
            .field("scope", &self.scope.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::collections::HashMap;

    fn capture(name: &str, registry: &Arc<Registry>) -> (Facade, Arc<MemorySink>, Arc<MemorySink>) {
        let low = Arc::new(MemorySink::new());
        let high = Arc::new(MemorySink::new());
        let config = FacadeConfig::new(name)
            .with_low_sink(low.clone())
            .with_low_formatter(formatter::message_formatter())
            .with_high_sink(high.clone())
            .with_high_formatter(formatter::message_formatter());
        (Facade::with_registry(config, registry.clone()), low, high)
    }

    #[test]
    fn test_default_config() {
        let config = FacadeConfig::default();
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.low_level, Severity::Debug);
        assert_eq!(config.high_level, Severity::Info);
        assert_eq!(config.effective_high_level(), Severity::Info);
        assert!(!config.monolog);
    }

    #[test]
    fn test_logger_names() {
        let registry = Arc::new(Registry::new());
        let (facade, _, _) = capture("myapp", &registry);
        assert_eq!(facade.logger().name(), "myapp.base");
        assert_eq!(facade.get_logger("area1").name(), "myapp.area1");
        assert_eq!(facade.get_logger("").name(), "myapp.base");
        assert_eq!(facade.root_logger().name(), "myapp");
        assert!(facade.get_logger("area1").same_node(&facade.get_logger("area1")));
        assert!(facade.registry().contains("myapp.area1"));
        assert!(Arc::ptr_eq(facade.registry(), &registry));
    }

    #[test]
    fn test_tiers_split_by_threshold() {
        let registry = Arc::new(Registry::new());
        let (facade, low, high) = capture("tiers", &registry);
        let logger = facade.logger();
        logger.debug("stdout hdlr only", &[]).unwrap();
        logger.error("both hdlrs", &[]).unwrap();
        assert_eq!(low.lines(), vec!["stdout hdlr only", "both hdlrs"]);
        assert_eq!(high.lines(), vec!["both hdlrs"]);
    }

    #[test]
    fn test_same_name_facades_do_not_share_handlers() {
        let registry = Arc::new(Registry::new());
        let (first, first_low, first_high) = capture("shared", &registry);
        let (second, second_low, second_high) = capture("shared", &registry);

        first.get_logger("area").info("from first", &[]).unwrap();
        second.get_logger("area").info("from second", &[]).unwrap();

        assert_eq!(first_low.lines(), vec!["from first"]);
        assert_eq!(first_high.lines(), vec!["from first"]);
        assert_eq!(second_low.lines(), vec!["from second"]);
        assert_eq!(second_high.lines(), vec!["from second"]);
        assert!(first.get_logger("area").same_node(&second.get_logger("area")));
    }

    #[test]
    fn test_verbose_and_monolog() {
        let registry = Arc::new(Registry::new());
        let low = Arc::new(MemorySink::new());
        let high = Arc::new(MemorySink::new());
        let config = FacadeConfig::new("mono")
            .with_low_sink(low.clone())
            .with_low_formatter(formatter::message_formatter())
            .with_high_sink(high.clone())
            .with_high_formatter(formatter::message_formatter())
            .with_monolog(true);
        let logger = Facade::with_registry(config, registry.clone()).logger();
        logger.debug("d", &[]).unwrap();
        logger.info("i", &[]).unwrap();
        logger.error("e", &[]).unwrap();
        assert_eq!(low.lines(), vec!["d"]);
        assert_eq!(high.lines(), vec!["i", "e"]);

        let quiet = FacadeConfig::new("q").with_verbose(Some(false));
        assert_eq!(quiet.effective_high_level(), Severity::Critical);
        let loud = FacadeConfig::new("l").with_verbose(Some(true));
        assert_eq!(loud.effective_high_level(), Severity::Debug);
    }

    #[test]
    fn test_structured_logger_persist() {
        let registry = Arc::new(Registry::new());
        let (facade, _, high) = capture("logger0", &registry);
        let logger = facade.get_structured_logger("base", true, Fields::new());
        let again = facade.get_structured_logger("base", true, Fields::new());

        logger
            .log(Severity::Debug, "message", &[], Some(&crate::fields! { "additional" => true }))
            .unwrap();
        again.debug("second", &[]).unwrap();

        let lines = high.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["persist"], true);
        assert_eq!(first["additional"], true);
        assert_eq!(first["name"], "logger0.base");
        assert_eq!(first["level"], "DEBUG");
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["persist"], true);
        assert!(second.get("additional").is_none());
    }

    #[test]
    fn test_structured_logger_output_is_json_only() {
        let registry = Arc::new(Registry::new());
        let high = Arc::new(MemorySink::new());
        let config = FacadeConfig::new("app").with_high_sink(high.clone());
        let facade = Facade::with_registry(config, registry);
        let jobs = facade.get_structured_logger("jobs", true, Fields::new());

        jobs.debug("queued", &[]).unwrap();
        jobs.info("done", &[]).unwrap();
        jobs.critical("failed %d times", &[Value::from(3)]).unwrap();
        facade.get_logger("web").info("plain", &[]).unwrap();

        let lines = high.lines();
        assert_eq!(lines.len(), 4, "{lines:?}");
        for line in &lines[..3] {
            let parsed: serde_json::Value =
                serde_json::from_str(line).unwrap_or_else(|e| panic!("non-JSON structured line {line:?}: {e}"));
            assert_eq!(parsed["persist"], true);
        }
        assert_eq!(lines[3], "app.web     : INFO     plain");
    }

    #[test]
    fn test_settings_deserialize() {
        let settings: FacadeSettings =
            serde_json::from_str(r#"{"name": "svc", "low_level": "info", "high_level": "Error", "monolog": true}"#)
                .unwrap();
        let config = FacadeConfig::from_settings(settings);
        assert_eq!(config.name, "svc");
        assert_eq!(config.low_level, Severity::Info);
        assert_eq!(config.high_level, Severity::Error);
        assert!(config.monolog);

        assert!(serde_json::from_str::<FacadeSettings>(r#"{"low_level": "chatty"}"#).is_err());
        assert!(serde_json::from_str::<FacadeSettings>(r#"{"colour": true}"#).is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (env::LOW_LEVEL_ENV, "warning"),
            (env::HIGH_LEVEL_ENV, "CRITICAL"),
            (env::VERBOSE_ENV, "yes"),
        ]
        .into_iter()
        .collect();
        let config = FacadeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.low_level, Severity::Warning);
        assert_eq!(config.high_level, Severity::Critical);
        assert_eq!(config.effective_high_level(), Severity::Debug);

        let err = FacadeConfig::from_lookup(|k| (k == env::LOW_LEVEL_ENV).then(|| "loud".to_string())).unwrap_err();
        assert!(matches!(err, LogError::UnknownSeverity(_)));
        let err = FacadeConfig::from_lookup(|k| (k == env::MONOLOG_ENV).then(|| "maybe".to_string())).unwrap_err();
        assert!(matches!(err, LogError::InvalidSetting { .. }));
    }
}
