use std::collections::HashSet;

use tiered_log::{fields, Facade, FacadeConfig, LogError, Severity, Value};

fn main() -> Result<(), LogError> {
    let going = Facade::with_config(FacadeConfig::from_env()?);

    let logger = going.get_structured_logger("jobs", true, fields! { "worker" => std::process::id() });
    logger.debug("queue drained", &[])?;

    let retried: HashSet<u32> = [7, 3, 11].into_iter().collect();
    logger.log(
        Severity::Warning,
        "%d jobs retried in %.2fs",
        &[Value::from(3), Value::from(1.5)],
        Some(&fields! { "job_ids" => retried, "queue" => "imports" }),
    )?;
    Ok(())
}
