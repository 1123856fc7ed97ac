use std::{
    fmt,
    io::ErrorKind,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use rosc::OscMessage;
use thiserror::Error;

use super::{message::FrameMessage, sample::FrameRecord};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: Arc<str>,
    pub port: u16,
}

impl Destination {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("could not bind UDP socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("could not resolve {destination}")]
    Resolve { destination: Destination },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent { bytes: usize, to: SocketAddr },
    Dropped,
}

/// Anything a frame can be handed to.
pub trait FrameSink {
    fn send(&self, record: &FrameRecord) -> Delivery;
}

impl<T: FrameSink + ?Sized> FrameSink for Arc<T> {
    fn send(&self, record: &FrameRecord) -> Delivery {
        (**self).send(record)
    }
}

/// Everything a send needs, swapped as one unit so host and port can never
/// be observed half-updated.
struct Target {
    destination: Destination,
    addr: Option<SocketAddr>,
    socket: Arc<UdpSocket>,
    ipv4: bool,
}

/// Fire-and-forget UDP sender for `/visage` frames.
pub struct NetworkEndpoint {
    target: Mutex<Arc<Target>>,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl NetworkEndpoint {
    /// Binds a socket for `destination`. A destination that does not resolve
    /// is kept anyway; frames are dropped until a resolvable one arrives.
    pub fn new(destination: &Destination) -> Result<Self, EndpointError> {
        let addr = resolve(destination);
        let ipv4 = addr.map_or(true, |a| a.is_ipv4());
        let socket = bind_for(ipv4)?;

        if addr.is_none() {
            log::warn!("Could not resolve {}, frames will be dropped", destination);
        }

        Ok(Self {
            target: Mutex::new(Arc::new(Target {
                destination: destination.clone(),
                addr,
                socket,
                ipv4,
            })),
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Points subsequent sends at `destination`. Sends already past their
    /// snapshot keep the old target.
    ///
    /// The destination is stored even when it cannot be used (no address, or
    /// no socket of the right family); frames are then dropped until the next
    /// reconfigure, and the error says why.
    pub fn reconfigure(&self, destination: &Destination) -> Result<(), EndpointError> {
        self.reconfigure_with(destination, bind_for)
    }

    fn reconfigure_with<B>(&self, destination: &Destination, bind: B) -> Result<(), EndpointError>
    where
        B: FnOnce(bool) -> Result<Arc<UdpSocket>, EndpointError>,
    {
        let current = self.snapshot();
        let mut target = Target {
            destination: destination.clone(),
            addr: resolve(destination),
            socket: current.socket.clone(),
            ipv4: current.ipv4,
        };

        let mut result = Ok(());
        match target.addr {
            Some(addr) if addr.is_ipv4() != current.ipv4 => match bind(addr.is_ipv4()) {
                Ok(socket) => {
                    target.socket = socket;
                    target.ipv4 = addr.is_ipv4();
                }
                Err(e) => {
                    target.addr = None;
                    result = Err(e);
                }
            },
            Some(_) => {}
            None => {
                result = Err(EndpointError::Resolve {
                    destination: destination.clone(),
                })
            }
        }

        match target.addr {
            Some(addr) => log::info!("Sending frames to {} ({})", destination, addr),
            None => log::warn!("{} is unusable, frames will be dropped", destination),
        }

        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(target);
        result
    }

    pub fn destination(&self) -> Destination {
        self.snapshot().destination.clone()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Arc<Target> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn drop_frame(&self) -> Delivery {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        Delivery::Dropped
    }
}

impl FrameSink for NetworkEndpoint {
    fn send(&self, record: &FrameRecord) -> Delivery {
        let Some(buf) = OscMessage::from_record(record).serialize() else {
            return self.drop_frame();
        };

        let target = self.snapshot();
        let Some(addr) = target.addr else {
            return self.drop_frame();
        };

        match target.socket.send_to(&buf, addr) {
            Ok(bytes) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                log::trace!("Sent {} bytes to {}", bytes, addr);
                Delivery::Sent { bytes, to: addr }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                log::trace!("Socket busy, dropping frame");
                self.drop_frame()
            }
            Err(e) => {
                log::trace!("Send to {} failed: {}", addr, e);
                self.drop_frame()
            }
        }
    }
}

fn resolve(destination: &Destination) -> Option<SocketAddr> {
    let addrs: Vec<SocketAddr> = (&*destination.host, destination.port)
        .to_socket_addrs()
        .map_err(|e| log::debug!("Resolving {} failed: {}", destination, e))
        .ok()?
        .collect();

    // Prefer IPv4 addresses over IPv6
    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

fn bind_for(ipv4: bool) -> Result<Arc<UdpSocket>, EndpointError> {
    let socket = if ipv4 {
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))
    }
    .map_err(EndpointError::Bind)?;

    socket.set_nonblocking(true).map_err(EndpointError::Bind)?;
    Ok(Arc::new(socket))
}
