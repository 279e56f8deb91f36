use std::collections::HashMap;

use pnet::datalink;
use pnet::ipnetwork::IpNetwork;

use crate::wire::types::FixedV4;

/// A single interface's name, OS index, and the IPv4 (network, netmask)
/// pairs bound to it.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub index: u32,
    pub name: String,
    pub networks: Vec<(FixedV4, FixedV4)>,
}

/// A snapshot of the host's network interfaces, taken once at startup.
/// Direct (non-relayed) pool selection matches a pool's (network, netmask)
/// against the arrival interface's CIDRs drawn from this table.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    by_index: HashMap<u32, InterfaceInfo>,
}

impl InterfaceTable {
    /// Enumerates the host's interfaces via the OS. Platforms pnet can't
    /// introspect (macOS under the degraded PKTINFO mode, for instance)
    /// simply yield fewer interfaces; an empty table is not an error.
    pub fn discover() -> Self {
        let mut by_index = HashMap::new();

        for iface in datalink::interfaces() {
            let networks = iface
                .ips
                .iter()
                .filter_map(|ip| match ip {
                    IpNetwork::V4(net) => {
                        Some((FixedV4::from(net.network()), FixedV4::from(net.mask())))
                    }
                    IpNetwork::V6(_) => None,
                })
                .collect();

            by_index.insert(
                iface.index,
                InterfaceInfo {
                    index: iface.index,
                    name: iface.name,
                    networks,
                },
            );
        }

        InterfaceTable { by_index }
    }
}

/// The interface-resolution boundary the dispatcher depends on, so
/// integration tests can substitute a fixed table without real interfaces.
pub trait InterfaceResolver: Send + Sync {
    fn name_by_index(&self, index: u32) -> Option<String>;
    fn networks_by_index(&self, index: u32) -> Vec<(FixedV4, FixedV4)>;
}

impl InterfaceResolver for InterfaceTable {
    fn name_by_index(&self, index: u32) -> Option<String> {
        self.by_index.get(&index).map(|info| info.name.clone())
    }

    fn networks_by_index(&self, index: u32) -> Vec<(FixedV4, FixedV4)> {
        self.by_index
            .get(&index)
            .map(|info| info.networks.clone())
            .unwrap_or_default()
    }
}
