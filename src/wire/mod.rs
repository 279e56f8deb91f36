pub mod constants;
pub mod header;
pub mod message;
pub mod options;
pub mod types;

pub use header::Header;
pub use message::Message;
pub use options::Options;
pub use types::{FixedV4, MacAddress};
