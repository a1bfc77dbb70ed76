//! Error types for the storage engine.

use thiserror::Error;
use crate::types::{NodeType, PageId};

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the storage engine
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page was never allocated by the store
    #[error("Page {0} not found")]
    PageNotFound(PageId),

    /// A node view was applied to a page claimed by another node type
    #[error("Page {page_id} holds node type {found}, expected {expected}")]
    TypeMismatch {
        page_id: PageId,
        expected: NodeType,
        found: i32,
    },

    /// Joined trees must have the same height
    #[error("Tree heights differ: {first} != {second}")]
    HeightMismatch { first: u32, second: u32 },

    /// Split or promotion broke a sizing invariant
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    /// The header page has no room for another descriptor entry
    #[error("Header page is full")]
    HeaderFull,

    /// Data corruption detected (e.g., a broken sibling ring)
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Invalid page format or size
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// Invalid operation for the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration rejected during validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid page error
    pub fn invalid_page(msg: impl Into<String>) -> Self {
        Self::InvalidPage(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an internal invariant error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
