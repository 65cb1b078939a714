//! Sets up tracing for the host manager to stdout/stderr

use tracing::{Level, event};
use tracing_subscriber::prelude::*;

use crate::Error;
use crate::conf::Tracing;

/// Setup our local tracer
///
/// # Arguments
///
/// * `name` - The name of the service we are tracing
/// * `conf` - The tracing settings to use
pub fn setup(name: &str, conf: &Tracing) -> Result<(), Error> {
    // build a stdout layer filtered at our configured level
    let local = tracing_subscriber::fmt::layer().with_filter(conf.level.to_filter());
    // init our tracing registry
    tracing_subscriber::registry()
        .with(local)
        .try_init()
        .map_err(|err| Error::new(format!("Failed to register stdout registry: {err}")))?;
    event!(Level::INFO, name, level = %conf.level, msg = "Tracing to stdout");
    Ok(())
}
