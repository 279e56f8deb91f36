#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("`interfaces` must be a non-empty list")]
    NoInterfaces,

    #[error("pool name {0:?} must not contain '/'")]
    InvalidPoolName(String),

    #[error("invalid address {value:?} in pool {pool}: {reason}")]
    InvalidAddress {
        pool: String,
        value: String,
        reason: String,
    },

    #[error("pools {first} and {second} both claim network {network}")]
    DuplicateNetwork {
        first: String,
        second: String,
        network: String,
    },

    #[error("pool name {0:?} is used by more than one pool")]
    DuplicatePoolName(String),

    #[error("reservation for MAC {mac} in pool {pool} collides with another reservation")]
    DuplicateReservationMac { pool: String, mac: String },

    #[error("reservation for IP {ip} in pool {pool} collides with another reservation")]
    DuplicateReservationIp { pool: String, ip: String },
}
