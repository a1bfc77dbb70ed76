//! File-backed page store.
//!
//! Page `n` lives at byte offset `n * page_size`. The file only ever grows;
//! deleted pages are not reclaimed.

use super::PageStore;
use crate::error::{Result, StorageError};
use crate::page::PageBuf;
use crate::types::PageId;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Page store over a single random-access file
pub struct FileStore {
    path: PathBuf,
    /// Open once `load` or `create` ran
    file: RwLock<Option<File>>,
    /// Whether to sync on each write
    sync_on_write: bool,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P, sync_on_write: bool) -> Self {
        Self {
            path: path.into(),
            file: RwLock::new(None),
            sync_on_write,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn not_open(&self) -> StorageError {
        StorageError::invalid_operation(format!("store {} is not open", self.path.display()))
    }
}

impl PageStore for FileStore {
    fn exists(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    fn load(&self) -> Result<()> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        *self.file.write() = Some(file);
        Ok(())
    }

    fn create(&self) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        *self.file.write() = Some(file);
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_size: usize) -> Result<PageBuf> {
        let offset = page_id.file_offset(page_size);
        let mut guard = self.file.write();
        let file = guard.as_mut().ok_or_else(|| self.not_open())?;

        if offset + page_size as u64 > file.metadata()?.len() {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut buf = PageBuf::new(page_size);
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf.as_bytes_mut())?;
        Ok(buf)
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        let offset = page_id.file_offset(data.len());
        let mut guard = self.file.write();
        let file = guard.as_mut().ok_or_else(|| self.not_open())?;

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        if self.sync_on_write {
            file.sync_data()?;
        }

        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool> {
        log::debug!("file store keeps page {} after delete", page_id);
        Ok(false)
    }

    fn sync(&self) -> Result<()> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or_else(|| self.not_open())?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_write_reopen() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.db");

        {
            let store = FileStore::new(&path, true);
            assert!(!store.exists());
            store.create()?;
            store.write_page(PageId::new(0), &[1u8; 64])?;
            store.write_page(PageId::new(2), &[3u8; 64])?;
        }

        let store = FileStore::new(&path, false);
        assert!(store.exists());
        store.load()?;
        assert_eq!(store.read_page(PageId::new(2), 64)?.as_bytes(), &[3u8; 64]);
        // the gap left by page 1 reads back as zeros
        assert_eq!(store.read_page(PageId::new(1), 64)?.as_bytes(), &[0u8; 64]);
        assert!(matches!(
            store.read_page(PageId::new(3), 64),
            Err(StorageError::PageNotFound(_))
        ));
        assert!(!store.delete_page(PageId::new(2))?);
        store.sync()?;
        Ok(())
    }

    #[test]
    fn test_unopened_store_errors() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never.db"), false);
        assert!(matches!(
            store.write_page(PageId::new(0), &[0u8; 8]),
            Err(StorageError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing.db"), false);
        assert!(matches!(store.load(), Err(StorageError::Io(_))));
    }
}
