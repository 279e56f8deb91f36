use tracing::{info, warn};

use crate::errors::PoolError;
use crate::pool::Pool;
use crate::wire::constants::{message_type_name, option, DHCP_ACK, DHCP_DISCOVER, DHCP_NAK, DHCP_OFFER, DHCP_RELEASE, DHCP_REQUEST};
use crate::wire::types::{FixedV4, MacAddress};
use crate::wire::{Message, Options};

/// Runs one decoded message against its pool and returns the reply to
/// send, if any. RELEASE and message types this server doesn't implement
/// never produce a reply.
pub fn handle(request: &Message, pool: &Pool) -> Option<Message> {
    let mac = request.header.chaddr;

    match request.message_type() {
        DHCP_DISCOVER => handle_discover(request, pool, mac),
        DHCP_REQUEST => handle_request(request, pool, mac),
        DHCP_RELEASE => {
            handle_release(pool, mac);
            None
        }
        other => {
            warn!(mac = %mac, message_type = message_type_name(other), "unimplemented DHCP message type");
            None
        }
    }
}

fn handle_discover(request: &Message, pool: &Pool, mac: MacAddress) -> Option<Message> {
    if let Some(lease) = pool.touch(mac) {
        info!(pool = %pool.name, %mac, ip = %lease.ip, "existing lease, replying OFFER");
        return Some(build_reply(request, pool, DHCP_OFFER, Some(lease.ip)));
    }

    match pool.new_lease(mac, String::new()) {
        Ok(lease) => {
            info!(pool = %pool.name, %mac, ip = %lease.ip, "new lease, replying OFFER");
            Some(build_reply(request, pool, DHCP_OFFER, Some(lease.ip)))
        }
        Err(PoolError::NoFreeIps) => {
            warn!(pool = %pool.name, %mac, "no free IPs, dropping DISCOVER");
            None
        }
    }
}

fn handle_request(request: &Message, pool: &Pool, mac: MacAddress) -> Option<Message> {
    let lease = match pool.touch(mac) {
        Some(lease) => lease,
        None => {
            warn!(pool = %pool.name, %mac, "REQUEST for unknown lease, replying NAK");
            return Some(build_reply(request, pool, DHCP_NAK, None));
        }
    };

    if request.header.ciaddr != lease.ip {
        warn!(
            pool = %pool.name, %mac,
            requested = %request.header.ciaddr, leased = %lease.ip,
            "REQUEST ciaddr mismatch, replying NAK"
        );
        return Some(build_reply(request, pool, DHCP_NAK, None));
    }

    info!(pool = %pool.name, %mac, ip = %lease.ip, "REQUEST confirmed, replying ACK");
    Some(build_reply(request, pool, DHCP_ACK, Some(lease.ip)))
}

fn handle_release(pool: &Pool, mac: MacAddress) {
    match pool.release(mac) {
        Some(lease) => info!(pool = %pool.name, %mac, ip = %lease.ip, "released lease"),
        None => warn!(pool = %pool.name, %mac, "RELEASE for unknown lease"),
    }
}

/// Assembles an OFFER/ACK/NAK per the fixed option ordering: message type,
/// subnet mask, routers, DNS, lease time (the last four only on OFFER/ACK),
/// then server identifier. The encoder appends the sentinel.
fn build_reply(request: &Message, pool: &Pool, message_type: u8, yiaddr: Option<FixedV4>) -> Message {
    let mut header = request.reply_header();
    header.yiaddr = yiaddr.unwrap_or(FixedV4::UNSPECIFIED);
    header.siaddr = pool.server_ip;

    let mut options = Options::new();
    options.insert(option::MESSAGE_TYPE, vec![message_type]);

    if matches!(message_type, DHCP_OFFER | DHCP_ACK) {
        options.insert(option::SUBNET_MASK, pool.netmask.bytes().to_vec());

        if !pool.routers.is_empty() {
            options.insert(option::ROUTER, concat_v4(&pool.routers));
        }
        if !pool.dns.is_empty() {
            options.insert(option::DNS_SERVER, concat_v4(&pool.dns));
        }

        let lease_seconds = pool.lease_time.whole_seconds().max(0) as u32;
        options.insert(option::LEASE_TIME, lease_seconds.to_be_bytes().to_vec());
    }

    options.insert(option::SERVER_ID, pool.server_ip.bytes().to_vec());

    Message { header, options }
}

fn concat_v4(addrs: &[FixedV4]) -> Vec<u8> {
    addrs.iter().flat_map(|ip| ip.bytes()).collect()
}
