use clap::Parser;
use hostmgr::{Conf, Error, HostCache, Inventory, Sweeper};
use std::sync::Arc;
use tracing::{Level, event};

mod args;

/// The host manager
#[tokio::main]
async fn main() -> Result<(), Error> {
    // get command line args
    let args = args::Args::parse();
    // try to load a config file
    let conf = Conf::new(&args.config)?;
    // setup our tracer
    hostmgr::trace::setup("HostManager", &conf.tracing)?;
    // build our host cache
    let cache = Arc::new(HostCache::new(conf.cache.clone()));
    // rebuild our hosts from the inventory if we have one
    match args.inventory.as_ref().or(conf.inventory.as_ref()) {
        Some(path) => Inventory::from_path(path)?.apply(&cache),
        None => event!(Level::WARN, msg = "No host inventory set, starting empty"),
    }
    // sweep expired holds and leases until we are told to stop
    let sweeper = Sweeper::new(cache, conf.sweep_interval());
    sweeper
        .start(async {
            // an error here means we cannot listen for ctrl-c so stop right away
            if let Err(err) = tokio::signal::ctrl_c().await {
                event!(Level::ERROR, err = %err, msg = "Failed to listen for ctrl-c");
            }
        })
        .await;
    Ok(())
}
