pub mod iface;
pub mod socket;

pub use iface::{InterfaceInfo, InterfaceResolver, InterfaceTable};
pub use socket::{DatagramIo, RawUdpSocket};
