use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::PersistenceError;
use crate::pool::lease::Lease;

/// Loads a pool's lease table from its JSON document. A missing file or an
/// empty file is not an error — it means "no leases yet".
pub fn load(path: &Path) -> Result<Vec<Lease>, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let leases: BTreeMap<String, Lease> = serde_json::from_str(&content).map_err(|source| {
        PersistenceError::Parse {
            path: path.display().to_string(),
            source,
        }
    })?;

    Ok(leases.into_values().collect())
}

/// Writes a pool's lease table to its JSON document, keyed by dotted-quad
/// IP string. Writes to a temp file alongside `path` and renames it over
/// the target, so a concurrent reader never observes a half-written file.
pub fn save(path: &Path, leases: &[Lease]) -> Result<(), PersistenceError> {
    let by_ip: BTreeMap<String, &Lease> = leases.iter().map(|l| (l.ip.to_string(), l)).collect();
    let json = serde_json::to_vec_pretty(&by_ip)?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, &json).map_err(|source| PersistenceError::Write {
        path: tmp_path.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| PersistenceError::Write {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}
