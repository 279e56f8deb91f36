#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read lease file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write lease file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lease file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize lease table: {0}")]
    Serialize(#[from] serde_json::Error),
}
