use crate::error::LogError;
use crate::handler::Handler;
use crate::interpolate::interpolate;
use crate::level::Severity;
use crate::record::LogRecord;
use crate::registry::{HandlerScope, LoggerNode};
use crate::sink::LogSink;
use crate::value::{Fields, Value};
use std::fmt;
use std::sync::Arc;

/// Handle on a named node of the logger tree.
///
/// Cheap to clone. A handle carries the persistent fields bound to it and,
/// when issued by a [`Facade`](crate::Facade), that facade's handler scope.
///
/// No level filtering happens here: every call is built into a record and
/// offered to every reachable handler, whose thresholds decide.
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
    scope: Option<Arc<HandlerScope>>,
    fields: Arc<Fields>,
}

impl Logger {
    pub(crate) fn from_node(node: Arc<LoggerNode>, scope: Option<Arc<HandlerScope>>) -> Self {
        Self { node, scope, fields: Arc::new(Fields::new()) }
    }

    /// Full dotted name.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Fields added to every record from this handle.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// A handle on the same node with `fields` merged over the current
    /// persistent fields.
    pub fn bind(&self, fields: Fields) -> Logger {
        let mut merged = (*self.fields).clone();
        merged.extend(fields);
        Logger {
            node: self.node.clone(),
            scope: self.scope.clone(),
            fields: Arc::new(merged),
        }
    }

    /// Whether both handles address the same node.
    pub fn same_node(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub fn parent(&self) -> Option<Logger> {
        self.node
            .parent()
            .map(|parent| Logger::from_node(parent.clone(), self.scope.clone()))
    }

    pub fn propagate(&self) -> bool {
        self.node.propagate()
    }

    /// Stop (or resume) ascent past this node. Shared by every handle on it.
    pub fn set_propagate(&self, propagate: bool) {
        self.node.set_propagate(propagate);
    }

    /// Attach `handler` to this node.
    ///
    /// Facade-issued handles attach into the facade's scope; plain registry
    /// handles attach to the node itself.
    pub fn add_handler(&self, handler: Handler) {
        match &self.scope {
            Some(scope) => scope.attach(self.node.name(), handler),
            None => self.node.add_handler(handler),
        }
    }

    /// Build a record and hand it to every reachable handler.
    ///
    /// 1. `args` are interpolated into `template` (skipped when empty).
    /// 2. Persistent fields are overlaid with `fields`; call fields win.
    /// 3. Handlers run in attachment order on this node, then on each
    ///    ancestor while `propagate` holds. A node with `propagate == false`
    ///    still runs its own handlers.
    ///
    /// The first failing write aborts dispatch and is returned.
    pub fn log(&self, level: Severity, template: &str, args: &[Value], fields: Option<&Fields>) -> Result<(), LogError> {
        let message = interpolate(template, args)?;
        let mut merged = (*self.fields).clone();
        if let Some(fields) = fields {
            merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let record = LogRecord::new(self.node.name(), level, message, merged);
        self.dispatch(&record)
    }

    /// Offer an already-built record to every reachable handler.
    ///
    /// A sink claimed by an admitting handler is skipped by every later
    /// handler on this dispatch path.
    pub fn dispatch(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut claimed: Vec<Arc<dyn LogSink>> = Vec::new();
        let mut offer = |handler: &Handler| -> Result<(), LogError> {
            if claimed.iter().any(|sink| handler.shares_sink(sink)) {
                return Ok(());
            }
            if handler.claims_sink() && handler.admits(record.level) {
                claimed.push(handler.sink().clone());
            }
            handler.handle(record)
        };

        let mut current = Some(&self.node);
        while let Some(node) = current {
            for handler in node.handlers() {
                offer(handler.as_ref())?;
            }
            if let Some(scope) = &self.scope {
                for handler in scope.handlers_at(node.name()) {
                    offer(handler.as_ref())?;
                }
            }
            if !node.propagate() {
                break;
            }
            current = node.parent();
        }
        Ok(())
    }

    pub fn debug(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log(Severity::Debug, template, args, None)
    }

    pub fn info(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log(Severity::Info, template, args, None)
    }

    pub fn warning(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log(Severity::Warning, template, args, None)
    }

    pub fn error(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log(Severity::Error, template, args, None)
    }

    pub fn critical(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log(Severity::Critical, template, args, None)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("scope", &self.scope.as_ref().map(|s| s.id()))
            .field("fields", &self.fields)
            .finish()
    }
}
