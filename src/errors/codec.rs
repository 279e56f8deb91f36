#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortHeader { expected: usize, got: usize },

    #[error("unsupported hardware type {0} (only 1, Ethernet, is supported)")]
    UnsupportedHType(u8),

    #[error("unsupported hardware address length {0} (only 6 is supported)")]
    UnsupportedHLen(u8),

    #[error("incorrect magic cookie")]
    BadMagic,

    #[error("option {code} value is too long ({len} bytes, max 255)")]
    OptionTooLong { code: u8, len: usize },

    #[error("invalid address literal: {0}")]
    BadAddress(String),

    #[error("invalid length for {0}: {1}")]
    BadLength(&'static str, usize),
}
