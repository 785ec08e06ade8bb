use crate::error::LogError;
use crate::facade::Facade;
use crate::layer::FacadeLayer;
use crate::level::Severity;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global `tracing` bridge.
///
/// **Fields**
/// - `min_level`: events below this severity are not forwarded.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top so events are also printed in `tracing`'s own format.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Severity,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Severity::Debug,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber that forwards every event into
/// `facade`.
///
/// **Errors**
/// - [`LogError::Subscriber`] if a global subscriber is already set.
pub fn init_tracing_with_config(facade: Facade, config: LayerConfig) -> Result<(), LogError> {
    let layer = FacadeLayer::new(facade).with_min_level(config.min_level);

    // Two concrete subscriber types, one per branch.
    let installed = if config.enable_stdout {
        let subscriber = Registry::default().with(layer).with(tracing_subscriber::fmt::layer());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.map_err(|e| LogError::Subscriber(e.to_string()))
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(facade: Facade) -> Result<(), LogError> {
    init_tracing_with_config(facade, LayerConfig::default())
}
