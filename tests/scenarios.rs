use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use rdhcpd::dispatch::handle_datagram;
use rdhcpd::net::{DatagramIo, InterfaceInfo, InterfaceResolver};
use rdhcpd::pool::{Pool, Reservation};
use rdhcpd::request;
use rdhcpd::wire::constants::{option, DHCP_ACK, DHCP_DISCOVER, DHCP_NAK, DHCP_OFFER, DHCP_RELEASE, DHCP_REQUEST};
use rdhcpd::wire::header::Header;
use rdhcpd::wire::types::{FixedV4, MacAddress};
use rdhcpd::wire::{Message, Options};

fn lan_pool(dir: &std::path::Path) -> Pool {
    Pool::new(
        "lan".into(),
        "10.0.0.0".parse().unwrap(),
        "255.255.255.0".parse().unwrap(),
        "10.0.0.10".parse().unwrap(),
        "10.0.0.20".parse().unwrap(),
        "10.0.0.254".parse().unwrap(),
        vec!["10.0.0.1".parse().unwrap()],
        vec!["1.1.1.1".parse().unwrap(), "1.0.0.1".parse().unwrap()],
        3600,
        Vec::new(),
        dir.join("lan.json"),
    )
    .unwrap()
}

fn discover_message(mac: MacAddress, xid: u32) -> Message {
    let mut header = Header::default();
    header.xid = xid;
    header.chaddr = mac;
    let mut options = Options::new();
    options.insert(option::MESSAGE_TYPE, vec![DHCP_DISCOVER]);
    Message { header, options }
}

fn request_message(mac: MacAddress, ciaddr: FixedV4) -> Message {
    let mut header = Header::default();
    header.chaddr = mac;
    header.ciaddr = ciaddr;
    let mut options = Options::new();
    options.insert(option::MESSAGE_TYPE, vec![DHCP_REQUEST]);
    Message { header, options }
}

fn release_message(mac: MacAddress, ciaddr: FixedV4) -> Message {
    let mut header = Header::default();
    header.chaddr = mac;
    header.ciaddr = ciaddr;
    let mut options = Options::new();
    options.insert(option::MESSAGE_TYPE, vec![DHCP_RELEASE]);
    Message { header, options }
}

#[test]
fn scenario_a_discover_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let pool = lan_pool(dir.path());
    let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();

    let reply = request::handle(&discover_message(mac, 0xed5c4610), &pool).unwrap();

    assert_eq!(reply.header.op, 2);
    assert_eq!(reply.header.yiaddr, "10.0.0.10".parse().unwrap());
    assert_eq!(reply.header.siaddr, "10.0.0.254".parse().unwrap());
    assert_eq!(reply.options.get_byte(option::MESSAGE_TYPE), Some(DHCP_OFFER));
    assert_eq!(reply.options.get_v4(option::SUBNET_MASK), Some([255, 255, 255, 0]));
    assert_eq!(reply.options.get(option::ROUTER), Some([10u8, 0, 0, 1].as_slice()));
    assert_eq!(
        reply.options.get(option::DNS_SERVER),
        Some([1u8, 1, 1, 1, 1, 0, 0, 1].as_slice())
    );
    assert_eq!(
        reply.options.get(option::LEASE_TIME),
        Some(3600u32.to_be_bytes().as_slice())
    );
    assert_eq!(reply.options.get_v4(option::SERVER_ID), Some([10, 0, 0, 254]));
}

#[test]
fn scenario_b_request_wrong_ip_naks() {
    let dir = tempfile::tempdir().unwrap();
    let pool = lan_pool(dir.path());
    let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();
    request::handle(&discover_message(mac, 1), &pool).unwrap();

    let reply = request::handle(&request_message(mac, "10.0.0.11".parse().unwrap()), &pool).unwrap();

    assert_eq!(reply.header.op, 2);
    assert_eq!(reply.options.get_byte(option::MESSAGE_TYPE), Some(DHCP_NAK));
    assert_eq!(reply.options.get_v4(option::SERVER_ID), Some([10, 0, 0, 254]));
    assert!(reply.options.get(option::SUBNET_MASK).is_none());
}

#[test]
fn scenario_c_request_correct_acks() {
    let dir = tempfile::tempdir().unwrap();
    let pool = lan_pool(dir.path());
    let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();
    request::handle(&discover_message(mac, 1), &pool).unwrap();

    let reply = request::handle(&request_message(mac, "10.0.0.10".parse().unwrap()), &pool).unwrap();

    assert_eq!(reply.options.get_byte(option::MESSAGE_TYPE), Some(DHCP_ACK));
    assert_eq!(reply.header.yiaddr, "10.0.0.10".parse().unwrap());
    assert_eq!(reply.options.get_v4(option::SUBNET_MASK), Some([255, 255, 255, 0]));
}

#[test]
fn scenario_d_release_then_touch_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let pool = lan_pool(dir.path());
    let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();
    request::handle(&discover_message(mac, 1), &pool).unwrap();

    let reply = request::handle(&release_message(mac, "10.0.0.10".parse().unwrap()), &pool);
    assert!(reply.is_none());
    assert!(pool.touch(mac).is_none());
}

#[test]
fn scenario_e_exhaustion_then_expiry_reclaims_first_expired() {
    let dir = tempfile::tempdir().unwrap();
    let pool = Pool::new(
        "tiny".into(),
        "10.0.0.0".parse().unwrap(),
        "255.255.255.0".parse().unwrap(),
        "10.0.0.10".parse().unwrap(),
        "10.0.0.11".parse().unwrap(),
        "10.0.0.254".parse().unwrap(),
        vec![],
        vec![],
        3600,
        Vec::new(),
        dir.path().join("tiny.json"),
    )
    .unwrap();

    let mac1: MacAddress = "00:1c:42:b4:6e:01".parse().unwrap();
    let mac2: MacAddress = "00:1c:42:b4:6e:02".parse().unwrap();
    let mac3: MacAddress = "00:1c:42:b4:6e:03".parse().unwrap();

    let lease1 = pool.new_lease(mac1, String::new()).unwrap();
    pool.new_lease(mac2, String::new()).unwrap();
    assert_eq!(pool.new_lease(mac3, String::new()).unwrap_err(), rdhcpd::errors::PoolError::NoFreeIps);

    // Expire mac1's lease by writing an already-past expiration directly to
    // the pool's persisted lease file and reloading, exercising the same
    // disk-backed path a restart would.
    let expired = rdhcpd::pool::Lease {
        mac: mac1,
        hostname: String::new(),
        ip: lease1.ip,
        expiration: time::OffsetDateTime::now_utc() - time::Duration::seconds(1),
    };
    let lease2 = pool.touch(mac2).unwrap();
    rdhcpd::pool::persistence::save(&dir.path().join("tiny.json"), &[expired, lease2]).unwrap();
    pool.load();

    let lease3 = pool.new_lease(mac3, String::new()).unwrap();
    assert_eq!(lease3.ip, "10.0.0.10".parse().unwrap());
}

#[test]
fn scenario_e_reservation_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let mac: MacAddress = "00:1c:42:b4:6e:09".parse().unwrap();
    let pool = Pool::new(
        "reserved".into(),
        "10.0.0.0".parse().unwrap(),
        "255.255.255.0".parse().unwrap(),
        "10.0.0.10".parse().unwrap(),
        "10.0.0.10".parse().unwrap(),
        "10.0.0.254".parse().unwrap(),
        vec![],
        vec![],
        3600,
        vec![Reservation {
            mac,
            ip: "10.0.0.200".parse().unwrap(),
            hostname: "printer".into(),
        }],
        dir.path().join("reserved.json"),
    )
    .unwrap();

    let lease = pool.new_lease(mac, String::new()).unwrap();
    assert_eq!(lease.ip, "10.0.0.200".parse().unwrap());
}

struct FakeResolver(HashMap<u32, InterfaceInfo>);

impl InterfaceResolver for FakeResolver {
    fn name_by_index(&self, index: u32) -> Option<String> {
        self.0.get(&index).map(|i| i.name.clone())
    }

    fn networks_by_index(&self, index: u32) -> Vec<(FixedV4, FixedV4)> {
        self.0.get(&index).map(|i| i.networks.clone()).unwrap_or_default()
    }
}

#[derive(Default)]
struct FakeIo {
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

#[async_trait::async_trait]
impl DatagramIo for FakeIo {
    async fn recv_with_interface(&self, _buf: &mut [u8]) -> io::Result<(usize, u32, SocketAddr)> {
        unreachable!("this scenario drives handle_datagram directly")
    }

    async fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.sent.lock().unwrap().push((buf.to_vec(), addr));
        Ok(buf.len())
    }
}

#[tokio::test]
async fn scenario_f_relayed_discover_routes_by_giaddr() {
    let dir = tempfile::tempdir().unwrap();
    let relay_pool = Pool::new(
        "relayed".into(),
        "192.168.5.0".parse().unwrap(),
        "255.255.255.0".parse().unwrap(),
        "192.168.5.10".parse().unwrap(),
        "192.168.5.20".parse().unwrap(),
        "192.168.5.254".parse().unwrap(),
        vec![],
        vec![],
        3600,
        Vec::new(),
        dir.path().join("relayed.json"),
    )
    .unwrap();

    // The arrival interface (eth1) doesn't own the 192.168.5.0/24 network
    // itself — the request reaches us only because a relay forwarded it.
    let mut interfaces = HashMap::new();
    interfaces.insert(
        3,
        InterfaceInfo {
            index: 3,
            name: "eth1".into(),
            networks: vec![("10.1.0.0".parse().unwrap(), "255.255.255.0".parse().unwrap())],
        },
    );
    let resolver = Arc::new(FakeResolver(interfaces));
    let io = Arc::new(FakeIo::default());

    let mut allowed = HashSet::new();
    allowed.insert("eth1".to_string());

    let mac: MacAddress = "00:1c:42:b4:6e:1d".parse().unwrap();
    let mut request = discover_message(mac, 0x1234);
    request.header.giaddr = "192.168.5.1".parse().unwrap();
    request.header.flags = 0x8000;
    let datagram = request.encode().unwrap();

    handle_datagram(
        Arc::clone(&io),
        resolver,
        Arc::from(vec![relay_pool]),
        allowed,
        datagram,
        3,
        SocketAddr::from(([192, 168, 5, 1], 67)),
    )
    .await;

    let sent = io.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, SocketAddr::from(([192, 168, 5, 1], 67)));

    let reply = Message::decode(&sent[0].0).unwrap();
    assert_eq!(reply.header.giaddr, "192.168.5.1".parse().unwrap());
    assert_eq!(reply.header.flags, 0x8000);
    assert_eq!(reply.options.get_byte(option::MESSAGE_TYPE), Some(DHCP_OFFER));
}
