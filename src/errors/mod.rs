mod codec;
mod config;
mod dispatch;
mod persistence;
mod pool;

pub use codec::CodecError;
pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use persistence::PersistenceError;
pub use pool::PoolError;
