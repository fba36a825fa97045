//! Read-only award catalog, loaded once at startup.
//!
//! File format: `{"awards": [{"id": 1, "name": "...", "nominees": [{"id": 1, "name": "..."}]}]}`

use crate::types::Award;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    awards: Vec<Award>,
}

/// Load the catalog. A missing file yields an empty catalog.
pub fn load_catalog(path: &Path) -> Result<Vec<Award>, CatalogError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("No award catalog at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    parse_catalog(&text)
}

pub fn parse_catalog(text: &str) -> Result<Vec<Award>, CatalogError> {
    let file: CatalogFile = serde_json::from_str(text)?;
    Ok(file.awards)
}
