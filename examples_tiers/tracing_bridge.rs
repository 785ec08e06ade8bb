//! `tracing` events routed through a facade. Set `BRIDGE_MIN_LEVEL` to
//! raise the forwarding floor.
use tiered_log::init::{init_tracing, init_tracing_with_config, LayerConfig};
use tiered_log::{Facade, LogError, Severity};

fn main() -> Result<(), LogError> {
    let facade = Facade::new("bridge");
    match std::env::var("BRIDGE_MIN_LEVEL") {
        Ok(level) => {
            let min_level: Severity = level.parse()?;
            init_tracing_with_config(facade, LayerConfig { min_level, enable_stdout: false })?;
        }
        Err(_) => init_tracing(facade)?,
    }

    tracing::debug!(target: "app::startup", "loading settings");
    tracing::info!(target: "app::http", port = 8080, "listening");
    tracing::error!(target: "app::db", attempts = 3, "connection refused");
    Ok(())
}
