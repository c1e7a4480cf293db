//! Folder document encoding.
//!
//! The hierarchy is stored as a compact JSON array of nodes, transferred
//! base64-encoded. Encoding is canonical: the same forest always yields
//! the same bytes, so saving an unmodified tree leaves the blob unchanged.

use folio_store::{decode_base64, encode_base64};

use crate::error::{TreeError, TreeResult};
use crate::node::FolderNode;

pub fn to_json(forest: &[FolderNode]) -> TreeResult<String> {
    serde_json::to_string(forest).map_err(|e| TreeError::Codec(e.to_string()))
}

pub fn from_json(json: &str) -> TreeResult<Vec<FolderNode>> {
    serde_json::from_str(json).map_err(|e| TreeError::Codec(e.to_string()))
}

/// Encode a forest into the stored transfer form.
pub fn encode(forest: &[FolderNode]) -> TreeResult<String> {
    Ok(encode_base64(to_json(forest)?.as_bytes()))
}

/// Decode the stored transfer form. An empty document is an empty forest.
pub fn decode(encoded: &str) -> TreeResult<Vec<FolderNode>> {
    let bytes = decode_base64(encoded).map_err(|e| TreeError::Codec(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|e| TreeError::Codec(e.to_string()))?;
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    from_json(&json)
}
