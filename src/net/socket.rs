use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// The socket I/O boundary the dispatcher depends on: receive a datagram
/// along with its arrival interface index, and send one back. Kept behind
/// a trait so scenario tests can substitute a fake without a bound socket.
#[async_trait]
pub trait DatagramIo: Send + Sync {
    async fn recv_with_interface(&self, buf: &mut [u8]) -> io::Result<(usize, u32, SocketAddr)>;
    async fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

/// A UDP socket bound for DHCP traffic, configured to report the arrival
/// interface of each datagram via `IP_PKTINFO` on Linux.
pub struct RawUdpSocket {
    socket: Arc<UdpSocket>,
}

impl RawUdpSocket {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::DGRAM,
            Some(socket2::Protocol::UDP),
        )?;
        socket.set_reuse_address(true)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        #[cfg(target_os = "linux")]
        linux::enable_pktinfo(&socket)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        Ok(RawUdpSocket {
            socket: Arc::new(socket),
        })
    }

    /// The underlying socket, shared so replies can be sent from worker
    /// tasks while the accept loop keeps receiving.
    pub fn handle(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }
}

#[async_trait]
impl DatagramIo for RawUdpSocket {
    async fn recv_with_interface(&self, buf: &mut [u8]) -> io::Result<(usize, u32, SocketAddr)> {
        loop {
            self.socket.readable().await?;

            #[cfg(target_os = "linux")]
            let attempt = linux::try_recvmsg(&self.socket, buf);
            #[cfg(not(target_os = "linux"))]
            let attempt = self.socket.try_recv_from(buf).map(|(n, addr)| (n, 0u32, addr));

            match attempt {
                Ok(result) => return Ok(result),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr).await
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
    use std::os::unix::io::AsRawFd;

    use tokio::net::UdpSocket;

    pub fn enable_pktinfo(socket: &socket2::Socket) -> io::Result<()> {
        let fd = socket.as_raw_fd();
        let enable: libc::c_int = 1;
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::IPPROTO_IP,
                libc::IP_PKTINFO,
                &enable as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// One non-blocking `recvmsg`, pulling the arrival interface index out
    /// of the `IP_PKTINFO` ancillary data alongside the datagram itself.
    pub fn try_recvmsg(socket: &UdpSocket, buf: &mut [u8]) -> io::Result<(usize, u32, SocketAddr)> {
        let fd = socket.as_raw_fd();

        let mut iov = libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        };

        #[repr(align(8))]
        struct CmsgBuf([u8; 128]);
        let mut cmsg_buf = CmsgBuf([0u8; 128]);

        let mut src_addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };

        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_name = &mut src_addr as *mut _ as *mut libc::c_void;
        msg.msg_namelen = std::mem::size_of::<libc::sockaddr_in>() as u32;
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = cmsg_buf.0.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = cmsg_buf.0.len() as _;

        let n = unsafe { libc::recvmsg(fd, &mut msg, libc::MSG_DONTWAIT) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut ifindex = 0u32;
        unsafe {
            let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
            while !cmsg.is_null() {
                let header = &*cmsg;
                if header.cmsg_level == libc::IPPROTO_IP && header.cmsg_type == libc::IP_PKTINFO {
                    let pktinfo = &*(libc::CMSG_DATA(cmsg) as *const libc::in_pktinfo);
                    ifindex = pktinfo.ipi_ifindex as u32;
                }
                cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
            }
        }

        let ip = Ipv4Addr::from(u32::from_be(src_addr.sin_addr.s_addr));
        let port = u16::from_be(src_addr.sin_port);
        Ok((n as usize, ifindex, SocketAddr::V4(SocketAddrV4::new(ip, port))))
    }
}
