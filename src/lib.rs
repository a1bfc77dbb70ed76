//! # RTree Storage Engine
//!
//! A paged, disk-oriented spatial storage engine: an R-tree over a custom
//! binary page format, with a family of spatial joins that run directly on
//! the on-disk nodes.
//!
//! ## Architecture
//!
//! The engine is composed of layered components:
//!
//! - **Page Layer** (`page`): Big-endian typed access to fixed-size pages
//! - **Node Layer** (`node`): Typed views (header, descriptor, index, leaf)
//! - **Storage Layer** (`storage`): Page stores and the workspace header
//! - **Buffer Layer** (`buffer`): Per-operation sessions and an LRU cache
//! - **R-Tree Layer** (`rtree`): Insertion with quadratic split, lookup
//! - **Join Layer** (`join`): Five co-descent join strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rtree_storage::{Config, Rect2, RectCodec, RTree, SpatialJoin};
//! use uuid::Uuid;
//!
//! let workspace = Config::new("spatial.db").page_size(4096).open_workspace()?;
//! let mut parks = RTree::new(workspace.clone(), Uuid::new_v4(), RectCodec::<2>::new())?;
//! let mut lakes = RTree::new(workspace, Uuid::new_v4(), RectCodec::<2>::new())?;
//!
//! parks.add(&Rect2::from_xywh(0.0, 0.0, 1.0, 1.0))?;
//! lakes.add(&Rect2::from_xywh(0.5, 0.5, 1.0, 1.0))?;
//!
//! for (park, lake) in SpatialJoin::new(&parks, &lakes)?.plane_sweep_join()? {
//!     println!("{} touches {}", park, lake);
//! }
//! ```

pub mod buffer;
pub mod error;
pub mod geometry;
pub mod join;
pub mod metrics;
pub mod node;
pub mod page;
pub mod rtree;
pub mod storage;
pub mod types;

pub use error::{Result, StorageError};
pub use types::{NodeType, PageId, DEFAULT_PAGE_SIZE};

// Re-export main public API
pub use buffer::{LruCache, Session};
pub use geometry::{Geometry, KeyCodec, Rect, Rect2, RectCodec, SpatialKey};
pub use join::{SpatialJoin, DEFAULT_JOIN_CACHE_PAGES};
pub use metrics::{JoinMetrics, JoinStrategy, PerformanceStats};
pub use rtree::{Direction, RTree};
pub use storage::{FileStore, MemoryStore, PageStore, Workspace};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Workspace configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Path to the store file (`None` keeps pages in memory)
    pub path: Option<PathBuf>,
    /// Page size in bytes for a new store (default: 4096)
    pub page_size: usize,
    /// Whether to sync writes immediately (default: false for performance)
    pub sync_on_write: bool,
    /// Page cache capacity of each join call (default: 8)
    pub join_cache_pages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            page_size: DEFAULT_PAGE_SIZE,
            sync_on_write: false,
            join_cache_pages: DEFAULT_JOIN_CACHE_PAGES,
        }
    }
}

impl Config {
    /// Create a file-backed configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Create a memory-backed configuration with default settings
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Enable sync on write for durability
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Set the join page cache capacity
    pub fn join_cache_pages(mut self, pages: usize) -> Self {
        self.join_cache_pages = pages;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Open or create the workspace this configuration describes
    pub fn open_workspace(&self) -> Result<Arc<Workspace>> {
        if self.join_cache_pages == 0 {
            return Err(StorageError::invalid_config("join cache needs at least one page"));
        }
        match &self.path {
            Some(path) => Workspace::file(path.clone(), self.page_size, self.sync_on_write),
            None => Workspace::memory(self.page_size),
        }
    }

    /// Join engine over two trees using the configured cache capacity
    pub fn spatial_join<'a, K: SpatialKey, C: KeyCodec<K>>(
        &self,
        first: &'a RTree<K, C>,
        second: &'a RTree<K, C>,
    ) -> Result<SpatialJoin<'a, K, C>> {
        SpatialJoin::with_cache_capacity(first, second, self.join_cache_pages)
    }
}

/// Bounds of one stored key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBounds {
    pub origin: Vec<f64>,
    pub extension: Vec<f64>,
}

impl KeyBounds {
    pub fn of<K: SpatialKey>(key: &K) -> Self {
        let axes = 0..key.dimensions();
        Self {
            origin: axes.clone().map(|axis| key.origin(axis)).collect(),
            extension: axes.map(|axis| key.extension(axis)).collect(),
        }
    }
}

/// Node type for visualization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Page ID
    pub page_id: u64,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Sibling links of the level ring
    pub previous_page_id: u64,
    pub next_page_id: u64,
    /// Key bounds in slot order
    pub keys: Vec<KeyBounds>,
    /// Entity ids (only for leaf nodes)
    pub entities: Vec<String>,
    /// Child nodes (only for index nodes)
    pub children: Vec<TreeNode>,
}
