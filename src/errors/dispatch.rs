#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("datagram arrived from unexpected source port {0} (expected 67 or 68)")]
    UnexpectedSourcePort(u16),

    #[error("datagram arrived on disallowed interface {0}")]
    DisallowedInterface(String),

    #[error("no pool matches interface {0}")]
    NoPoolForInterface(String),

    #[error("no pool matches relay gateway {0}")]
    NoPoolForGateway(String),

    #[error("failed to resolve arrival interface: {0}")]
    InterfaceResolution(String),
}
