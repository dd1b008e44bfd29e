//! engine::objects
//!
//! JSON encoding of persisted objects.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::EngineError;
use crate::core::layout::Location;
use crate::store::{ContentStore, Version};

/// Read and decode a JSON object with its version token.
pub(crate) async fn read_json<T: DeserializeOwned>(
    store: &dyn ContentStore,
    location: &Location,
) -> Result<Option<(T, Version)>, EngineError> {
    let Some(object) = store.read(location).await? else {
        return Ok(None);
    };
    let value = serde_json::from_slice(&object.bytes).map_err(|e| EngineError::CorruptObject {
        location: location.clone(),
        message: e.to_string(),
    })?;
    Ok(Some((value, object.version)))
}

/// Pretty JSON (two-space indent) with a trailing newline.
pub(crate) fn to_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, EngineError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}
