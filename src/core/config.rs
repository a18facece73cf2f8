//! JSON persistence for stream parameters.

use std::path::Path;

use crate::core::types::RtPghiParams;
use crate::error::PhaseError;

/// Writes parameters as pretty-printed JSON.
pub fn write_params_json(path: &Path, params: &RtPghiParams) -> Result<(), PhaseError> {
    let json = serde_json::to_string_pretty(params).map_err(|e| {
        PhaseError::InvalidConfig(format!("failed to serialize parameters: {}", e))
    })?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads and validates parameters from JSON. Omitted optional fields take
/// their defaults.
pub fn read_params_json(path: &Path) -> Result<RtPghiParams, PhaseError> {
    let data = std::fs::read_to_string(path)?;
    let params: RtPghiParams = serde_json::from_str(&data).map_err(|e| {
        PhaseError::InvalidConfig(format!(
            "failed to parse parameters from {}: {}",
            path.display(),
            e
        ))
    })?;
    params.validate()?;
    Ok(params)
}
