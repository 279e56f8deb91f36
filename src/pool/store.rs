use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use time::{Duration, OffsetDateTime};

use crate::errors::{ConfigError, PoolError};
use crate::pool::lease::Lease;
use crate::pool::persistence;
use crate::pool::reservation::Reservation;
use crate::wire::types::{FixedV4, MacAddress};

#[derive(Default)]
struct Inner {
    leases_by_mac: HashMap<MacAddress, Lease>,
    leases_by_ip: HashMap<FixedV4, Lease>,
}

/// A contiguous range of IPv4 addresses on a single subnet, with the
/// parameters a server returns to clients (mask, routers, DNS, lease
/// time), static reservations, and a mutex-guarded lease index.
pub struct Pool {
    pub name: String,
    pub network: FixedV4,
    pub netmask: FixedV4,
    pub broadcast: FixedV4,
    pub start: FixedV4,
    pub end: FixedV4,
    pub server_ip: FixedV4,
    pub routers: Vec<FixedV4>,
    pub dns: Vec<FixedV4>,
    pub lease_time: Duration,
    reservations_by_mac: HashMap<MacAddress, Reservation>,
    reservations_by_ip: HashMap<FixedV4, Reservation>,
    lease_file: PathBuf,
    inner: Mutex<Inner>,
}

impl Pool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        network: FixedV4,
        netmask: FixedV4,
        start: FixedV4,
        end: FixedV4,
        server_ip: FixedV4,
        routers: Vec<FixedV4>,
        dns: Vec<FixedV4>,
        lease_time_secs: u32,
        reservations: Vec<Reservation>,
        lease_file: PathBuf,
    ) -> Result<Self, ConfigError> {
        let broadcast = FixedV4::from_u32(network.to_u32() | !netmask.to_u32());

        let mut reservations_by_mac = HashMap::new();
        let mut reservations_by_ip = HashMap::new();
        for reservation in reservations {
            if reservations_by_mac.contains_key(&reservation.mac) {
                return Err(ConfigError::DuplicateReservationMac {
                    pool: name.clone(),
                    mac: reservation.mac.to_string(),
                });
            }
            if reservations_by_ip.contains_key(&reservation.ip) {
                return Err(ConfigError::DuplicateReservationIp {
                    pool: name.clone(),
                    ip: reservation.ip.to_string(),
                });
            }
            reservations_by_mac.insert(reservation.mac, reservation.clone());
            reservations_by_ip.insert(reservation.ip, reservation);
        }

        Ok(Pool {
            name,
            network,
            netmask,
            broadcast,
            start,
            end,
            server_ip,
            routers,
            dns,
            lease_time: Duration::seconds(lease_time_secs as i64),
            reservations_by_mac,
            reservations_by_ip,
            lease_file,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// True if `ip` lies within this pool's (network, netmask).
    pub fn contains_network(&self, ip: FixedV4) -> bool {
        (ip.to_u32() & self.netmask.to_u32()) == (self.network.to_u32() & self.netmask.to_u32())
    }

    pub fn matches_network(&self, network: FixedV4, netmask: FixedV4) -> bool {
        self.network == network && self.netmask == netmask
    }

    /// Loads the pool's persisted lease table, replacing whatever is in
    /// memory. Returns the number of leases loaded. A load failure is
    /// logged and treated as an empty table rather than aborting startup.
    pub fn load(&self) -> usize {
        match persistence::load(&self.lease_file) {
            Ok(leases) => {
                let mut inner = self.inner.lock().unwrap();
                inner.leases_by_mac.clear();
                inner.leases_by_ip.clear();
                let count = leases.len();
                for lease in leases {
                    inner.leases_by_ip.insert(lease.ip, lease.clone());
                    inner.leases_by_mac.insert(lease.mac, lease);
                }
                count
            }
            Err(err) => {
                tracing::error!(pool = %self.name, error = %err, "failed to load persisted leases; starting empty");
                0
            }
        }
    }

    fn persist(&self, inner: &Inner) {
        let leases: Vec<Lease> = inner.leases_by_mac.values().cloned().collect();
        if let Err(err) = persistence::save(&self.lease_file, &leases) {
            tracing::error!(pool = %self.name, error = %err, "failed to persist lease table");
        }
    }

    /// Finds an address for `mac`: the reservation if one exists, else the
    /// lowest free address in [start, end], reclaiming the first expired
    /// lease seen if the range is otherwise exhausted.
    fn allocate(&self, inner: &mut Inner, mac: MacAddress, now: OffsetDateTime) -> Result<FixedV4, PoolError> {
        if let Some(reservation) = self.reservations_by_mac.get(&mac) {
            return Ok(reservation.ip);
        }

        let start = self.start.to_u32();
        let end = self.end.to_u32();
        let mut expired: Option<FixedV4> = None;
        let mut addr = start;

        loop {
            let candidate = FixedV4::from_u32(addr);
            if !self.reservations_by_ip.contains_key(&candidate) {
                match inner.leases_by_ip.get(&candidate) {
                    None => return Ok(candidate),
                    Some(lease) => {
                        if expired.is_none() && lease.is_expired(now) {
                            expired = Some(candidate);
                        }
                    }
                }
            }
            if addr == end {
                break;
            }
            addr += 1;
        }

        match expired {
            Some(ip) => {
                if let Some(reclaimed) = inner.leases_by_ip.remove(&ip) {
                    inner.leases_by_mac.remove(&reclaimed.mac);
                }
                Ok(ip)
            }
            None => Err(PoolError::NoFreeIps),
        }
    }

    pub fn new_lease(&self, mac: MacAddress, hostname: String) -> Result<Lease, PoolError> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().unwrap();
        let ip = self.allocate(&mut inner, mac, now)?;

        let lease = Lease {
            mac,
            hostname,
            ip,
            expiration: now + self.lease_time,
        };
        inner.leases_by_mac.insert(mac, lease.clone());
        inner.leases_by_ip.insert(ip, lease.clone());
        self.persist(&inner);
        Ok(lease)
    }

    pub fn touch(&self, mac: MacAddress) -> Option<Lease> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().unwrap();
        let mut lease = inner.leases_by_mac.get(&mac)?.clone();
        lease.expiration = now + self.lease_time;
        inner.leases_by_mac.insert(mac, lease.clone());
        inner.leases_by_ip.insert(lease.ip, lease.clone());
        self.persist(&inner);
        Some(lease)
    }

    pub fn release(&self, mac: MacAddress) -> Option<Lease> {
        let mut inner = self.inner.lock().unwrap();
        let lease = inner.leases_by_mac.remove(&mac)?;
        inner.leases_by_ip.remove(&lease.ip);
        self.persist(&inner);
        Some(lease)
    }
}
