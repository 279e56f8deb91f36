#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum PoolError {
    #[error("no free IPs available in pool")]
    NoFreeIps,
}
