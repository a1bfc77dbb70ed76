//! Page layer: fixed-size binary pages with typed big-endian primitives.
//!
//! A page is a plain byte array of the workspace page size. Byte 0 is the
//! modified (dirty) flag; everything after it is uninterpreted until a node
//! view from [`crate::node`] is applied.
//!
//! ```text
//! +---+--------------------------------------------------------------+
//! | M |  node header / features / entries ...        ... keys        |
//! +---+--------------------------------------------------------------+
//!   0   1                                                   page_size
//! ```

mod binary;
mod cursor;
mod matrix;

pub use binary::{Page, MODIFIED_OFFSET};
pub use cursor::{size_of_string, PullCursor, PushCursor};
pub use matrix::{ElementKind, Matrix, MatrixData};

/// A raw page buffer
#[derive(Clone, PartialEq, Eq)]
pub struct PageBuf {
    data: Vec<u8>,
}

impl PageBuf {
    /// Create a new zeroed page buffer
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
        }
    }

    /// Create a page buffer of `size` bytes from raw bytes, zero padding or
    /// truncating as needed
    pub fn from_bytes(bytes: &[u8], size: usize) -> Self {
        let mut data = vec![0u8; size];
        let len = bytes.len().min(size);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { data }
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a reference to the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl From<Vec<u8>> for PageBuf {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl std::fmt::Debug for PageBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBuf").field("len", &self.data.len()).finish()
    }
}

impl std::ops::Deref for PageBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::ops::DerefMut for PageBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl AsRef<[u8]> for PageBuf {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for PageBuf {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
