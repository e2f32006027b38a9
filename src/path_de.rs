use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ConvertError, Result};

/// Deserialize with JSON-path context in error messages. `origin` names the
/// document (usually its file path).
pub fn from_value_with_path<T: DeserializeOwned>(origin: &str, value: Value) -> Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| document_error(origin, err))
}

fn document_error(origin: &str, err: serde_path_to_error::Error<serde_json::Error>) -> ConvertError {
    let path = err.path().to_string();
    ConvertError::Document {
        path: origin.to_string(),
        message: format!("at JSON path {path} → {}", err.into_inner()),
    }
}
