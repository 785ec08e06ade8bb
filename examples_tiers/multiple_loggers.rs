//! Console gets INFO and up in a short layout; `myapp.log` (or `$MYAPP_LOG`)
//! gets everything with timestamps.
use std::sync::Arc;

use tiered_log::env::env_or;
use tiered_log::{formatter, Facade, FacadeConfig, FileSink, LogError};

fn main() -> Result<(), LogError> {
    let config = FacadeConfig::new("myapp")
        .with_low_sink(Arc::new(FileSink::open(env_or("MYAPP_LOG", "myapp.log"))?))
        .with_low_formatter(formatter::fixed_formatter())
        .with_high_formatter(formatter::console_formatter());
    let going = Facade::with_config(config);

    let root = going.logger();
    let area1 = going.get_logger("area1");
    let area2 = going.get_logger("area2");

    root.info("Jackdaws love my big sphinx of quartz.", &[])?;
    area1.debug("Quick zephyrs blow, vexing daft Jim.", &[])?;
    area1.info("How quickly daft jumping zebras vex.", &[])?;
    area2.warning("Jail zesty vixen who grabbed pay.", &[])?;
    area2.error("The five boxing wizards jump quickly.", &[])?;
    Ok(())
}
