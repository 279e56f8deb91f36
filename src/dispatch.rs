use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::errors::DispatchError;
use crate::net::{DatagramIo, InterfaceResolver};
use crate::pool::Pool;
use crate::request;
use crate::wire::Message;

const MAX_DATAGRAM: usize = 1500;

/// Interface-to-pool resolution, bounded-concurrency worker fan-out, and
/// reply routing. One instance owns the listening socket for the lifetime
/// of the process.
pub struct Dispatcher<IO, R> {
    io: Arc<IO>,
    resolver: Arc<R>,
    pools: Arc<[Pool]>,
    allowed_interfaces: HashSet<String>,
    semaphore: Arc<tokio::sync::Semaphore>,
    request_timeout: Duration,
}

impl<IO, R> Dispatcher<IO, R>
where
    IO: DatagramIo + 'static,
    R: InterfaceResolver + 'static,
{
    pub fn new(
        io: Arc<IO>,
        resolver: Arc<R>,
        pools: Vec<Pool>,
        allowed_interfaces: HashSet<String>,
        max_concurrent_requests: usize,
        request_timeout: Duration,
    ) -> Self {
        Dispatcher {
            io,
            resolver,
            pools: pools.into(),
            allowed_interfaces,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent_requests)),
            request_timeout,
        }
    }

    /// Runs the accept loop. A transient receive error is logged and the
    /// loop continues — it never terminates on its own.
    pub async fn run(&self) -> ! {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.io.recv_with_interface(&mut buf).await {
                Ok((n, ifindex, sender)) => self.dispatch(buf[..n].to_vec(), ifindex, sender),
                Err(err) => error!(error = %err, "receive failed, continuing"),
            }
        }
    }

    /// Admits one datagram if a concurrency slot is free; otherwise drops
    /// it immediately. The accept loop never awaits admission.
    fn dispatch(&self, datagram: Vec<u8>, ifindex: u32, sender: SocketAddr) {
        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            warn!("server busy, dropping datagram");
            return;
        };

        let io = Arc::clone(&self.io);
        let resolver = Arc::clone(&self.resolver);
        let pools = Arc::clone(&self.pools);
        let allowed_interfaces = self.allowed_interfaces.clone();
        let request_timeout = self.request_timeout;

        tokio::spawn(async move {
            let _permit = permit;
            let result = tokio::time::timeout(
                request_timeout,
                handle_datagram(io, resolver, pools, allowed_interfaces, datagram, ifindex, sender),
            )
            .await;

            if result.is_err() {
                warn!("request exceeded its deadline, abandoning");
            }
        });
    }
}

/// Processes one already-received datagram end to end: source/interface
/// validation, decode, pool selection, the request handler, and reply
/// routing. Exposed (rather than folded into the accept loop) so
/// integration tests can drive it directly against fake I/O.
pub async fn handle_datagram<IO: DatagramIo, R: InterfaceResolver>(
    io: Arc<IO>,
    resolver: Arc<R>,
    pools: Arc<[Pool]>,
    allowed_interfaces: HashSet<String>,
    datagram: Vec<u8>,
    ifindex: u32,
    sender: SocketAddr,
) {
    if let Err(err) = validate_source(sender) {
        warn!(error = %err, "dropping datagram");
        return;
    }

    let interface_name = match resolver.name_by_index(ifindex) {
        Some(name) => name,
        None => {
            let err = DispatchError::InterfaceResolution(format!("no interface with index {ifindex}"));
            warn!(error = %err, "dropping datagram");
            return;
        }
    };

    if !allowed_interfaces.contains(&interface_name) {
        warn!(error = %DispatchError::DisallowedInterface(interface_name), "dropping datagram");
        return;
    }

    let message = match Message::decode(&datagram) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to decode datagram, dropping");
            return;
        }
    };

    let relayed = !message.header.giaddr.is_unspecified();
    let pool = if relayed {
        pools.iter().find(|pool| pool.contains_network(message.header.giaddr))
    } else {
        let networks = resolver.networks_by_index(ifindex);
        pools
            .iter()
            .find(|pool| networks.iter().any(|&(network, mask)| pool.matches_network(network, mask)))
    };

    let Some(pool) = pool else {
        let err = if relayed {
            DispatchError::NoPoolForGateway(message.header.giaddr.to_string())
        } else {
            DispatchError::NoPoolForInterface(interface_name)
        };
        warn!(error = %err, "dropping datagram");
        return;
    };

    let Some(reply) = request::handle(&message, pool) else {
        return;
    };

    let encoded = match reply.encode() {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(error = %err, "failed to encode reply, dropping");
            return;
        }
    };

    let target = if relayed {
        SocketAddr::new(IpAddr::V4(message.header.giaddr.into()), 67)
    } else {
        SocketAddr::new(IpAddr::V4(pool.broadcast.into()), 68)
    };

    if let Err(err) = io.send_to(&encoded, target).await {
        error!(error = %err, %target, "failed to send reply");
    }
}

fn validate_source(sender: SocketAddr) -> Result<(), DispatchError> {
    match sender.port() {
        67 | 68 => Ok(()),
        other => Err(DispatchError::UnexpectedSourcePort(other)),
    }
}
