pub mod config;
pub mod dispatch;
pub mod errors;
pub mod net;
pub mod pool;
pub mod request;
pub mod wire;

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::net::{InterfaceTable, RawUdpSocket};

#[derive(Debug, Parser)]
#[command(name = "rdhcpd", about = "A DHCPv4 server for directly-attached Ethernet networks")]
pub struct Cli {
    /// Path to the YAML configuration document.
    #[arg(long)]
    pub conf: PathBuf,
}

/// Loads and validates configuration, restores each pool's persisted
/// leases, binds the listening socket, and runs the dispatcher's accept
/// loop. Only returns (with an error) on a startup failure — privilege
/// drop and binding to port 67 as a non-root process are the caller's
/// responsibility, not this crate's.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.conf)?;
    let pools = settings.build_pools()?;

    for pool in &pools {
        let loaded = pool.load();
        info!(pool = %pool.name, start = %pool.start, end = %pool.end, loaded, "pool ready");
    }

    let socket = RawUdpSocket::bind(SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 67))?;
    let resolver = Arc::new(InterfaceTable::discover());
    let allowed_interfaces: HashSet<String> = settings.interfaces.iter().cloned().collect();

    info!(interfaces = ?allowed_interfaces, pools = pools.len(), "listening on 0.0.0.0:67");

    let dispatcher = Dispatcher::new(
        Arc::new(socket),
        resolver,
        pools,
        allowed_interfaces,
        settings.max_concurrent_requests,
        Duration::from_secs(settings.request_timeout_seconds),
    );

    dispatcher.run().await
}
