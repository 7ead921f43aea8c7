//! Structured error types for vgrid.
//!
//! Most inconsistent UI states are clamped or short-circuited rather than raised;
//! the variants here cover configuration and programming errors.

/// All errors that can occur while configuring or driving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A column config referenced a type nobody registered.
    #[error("Column type '{0}' not registered")]
    ColumnTypeNotRegistered(String),

    /// Two columns resolved to the same id.
    #[error("Duplicate column id: {0}")]
    DuplicateColumn(String),

    /// Unknown or ill-typed selection mode option.
    #[error("Invalid selection option '{name}': {reason}")]
    SelectionOption {
        /// Option name as passed by the caller.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid grid or row manager configuration.
    #[error("Invalid config: {0}")]
    Config(String),

    /// JSON (de)serialization failure.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (CLI only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
