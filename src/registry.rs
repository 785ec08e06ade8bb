use crate::handler::Handler;
use crate::logger::Logger;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

/// Name used when a lookup contains no usable path segment.
pub const ROOT_NAME: &str = "root";

/// One node of the dotted-name logger tree.
///
/// Nodes hold their parent strongly; parents never point at children, so
/// the tree has no cycles and an ancestor outlives every descendant handle.
pub struct LoggerNode {
    name: String,
    parent: Option<Arc<LoggerNode>>,
    handlers: RwLock<Vec<Arc<Handler>>>,
    propagate: AtomicBool,
}

impl LoggerNode {
    fn new(name: String, parent: Option<Arc<LoggerNode>>) -> Self {
        Self {
            name,
            parent,
            handlers: RwLock::new(Vec::new()),
            propagate: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<LoggerNode>> {
        self.parent.as_ref()
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }

    /// Attach a handler visible to every logger handle on this node.
    pub fn add_handler(&self, handler: Handler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// Snapshot of attached handlers, in attachment order.
    pub fn handlers(&self) -> Vec<Arc<Handler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Process-wide (or test-local) tree of loggers keyed by dotted name.
///
/// Lookups are memoized: the same name always yields the same node, and
/// missing ancestors are created within the same lookup. Nodes are never
/// removed.
#[derive(Default)]
pub struct Registry {
    nodes: RwLock<HashMap<String, Arc<LoggerNode>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry used when none is injected.
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    /// Fetch the node for `name`, creating it and any missing ancestors.
    ///
    /// Empty segments are ignored (`"a..b"` is `"a.b"`); a name with no
    /// segments at all maps to [`ROOT_NAME`].
    pub fn node(&self, name: &str) -> Arc<LoggerNode> {
        let name = normalize(name);
        if let Some(node) = self.nodes.read().unwrap_or_else(PoisonError::into_inner).get(&name) {
            return node.clone();
        }

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let mut segments = name.split('.');
        let mut path = segments.next().unwrap_or(ROOT_NAME).to_string();
        let mut node = get_or_insert(&mut nodes, &path, None);
        for segment in segments {
            path.push('.');
            path.push_str(segment);
            node = get_or_insert(&mut nodes, &path, Some(node));
        }
        node
    }

    /// A logger handle on `name` with no facade-local handlers.
    pub fn logger(&self, name: &str) -> Logger {
        Logger::from_node(self.node(name), None)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(name: &str) -> String {
    let joined = name.split('.').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(".");
    if joined.is_empty() {
        ROOT_NAME.to_string()
    } else {
        joined
    }
}

fn get_or_insert(
    nodes: &mut HashMap<String, Arc<LoggerNode>>,
    path: &str,
    parent: Option<Arc<LoggerNode>>,
) -> Arc<LoggerNode> {
    if let Some(existing) = nodes.get(path) {
        return existing.clone();
    }
    let node = Arc::new(LoggerNode::new(path.to_string(), parent));
    nodes.insert(path.to_string(), node.clone());
    tracing::debug!(logger = path, "created logger node");
    node
}

/// Handlers owned by one facade, keyed by the node they hang off.
///
/// Logger handles issued by a facade carry its scope; handles from other
/// facades never see these handlers even when node names coincide.
pub(crate) struct HandlerScope {
    id: u64,
    attached: RwLock<Vec<(String, Arc<Handler>)>>,
    dedicated: Mutex<HashSet<String>>,
}

impl HandlerScope {
    pub(crate) fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            attached: RwLock::new(Vec::new()),
            dedicated: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn attach(&self, node: &str, handler: Handler) {
        self.attached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((node.to_string(), Arc::new(handler)));
    }

    /// Attach `make()` to `node` unless one was already attached under `key`.
    pub(crate) fn attach_once(&self, node: &str, key: &str, make: impl FnOnce() -> Handler) {
        let first = self
            .dedicated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format!("{node}\u{0}{key}"));
        if first {
            self.attach(node, make());
        }
    }

    pub(crate) fn handlers_at(&self, node: &str) -> Vec<Arc<Handler>> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(name, _)| name == node)
            .map(|(_, handler)| handler.clone())
            .collect()
    }
}
