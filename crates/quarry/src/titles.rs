//! Titles artifact: a doc-id to title map stored alongside the indices.
//!
//! The map is opaque to the retrieval core; it exists so the display layer
//! can show a headline next to each hit without loading the corpus.

use quarry_retrieve::persistence::{
    self, PersistenceError, PersistenceResult, TITLES_MAGIC,
};
use std::collections::HashMap;
use std::path::Path;

/// Write the titles map as a single artifact file.
pub fn save(path: &Path, titles: &HashMap<String, String>) -> PersistenceResult<()> {
    let payload = postcard::to_allocvec(titles)?;
    let bytes = persistence::frame_artifact(TITLES_MAGIC, 0, &payload)?;
    persistence::atomic_write(path, &bytes)
}

/// Load a titles artifact written by [`save`].
pub fn load(path: &Path) -> PersistenceResult<HashMap<String, String>> {
    let bytes = persistence::read_artifact(path)?;
    let (_, payload) = persistence::split_artifact(&bytes, TITLES_MAGIC)?;
    postcard::from_bytes(payload).map_err(|e| PersistenceError::Deserialization(e.to_string()))
}
