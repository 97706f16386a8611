// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Capability objects for random-access byte I/O against a backing store.
//! [`BlockManager`](crate::block_manager::BlockManager) is independent of the
//! storage substrate precisely because it only ever talks to a `dyn FileHandle`.

use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;

use parking_lot::RwLock;

use crate::error::Error;

/// A seekable byte store a [`BlockManager`](crate::block_manager::BlockManager) can page through.
///
/// `write_at` followed by `sync` must be durable: once `sync` returns, any
/// subsequent `read_at` against the same backing file observes the written
/// bytes. `read_at` past EOF may return a short count.
pub trait FileHandle: std::fmt::Debug + Send + Sync {
    /// Reads up to `buf.len()` bytes starting at `offset`, returning the count read.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, Error>;

    /// Writes `buf` starting at `offset`, returning the count written.
    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, Error>;

    /// Flushes buffered writes to durable storage. A barrier: writes issued before
    /// `sync` returns must be observable by any subsequent `read_at`.
    fn sync(&self) -> Result<(), Error>;
}

/// An OS-file backed [`FileHandle`], using positional reads/writes
/// (`pread`/`pwrite` via [`FileExt`]) rather than a shared seek cursor, so the
/// handle can be used from `&self` without serializing access through a mutex.
#[derive(Debug)]
pub struct OsFileHandle {
    file: File,
}

impl OsFileHandle {
    pub fn open(path: impl AsRef<Path>, create_new: bool) -> Result<Self, Error> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(create_new)
            .truncate(create_new)
            .open(path)?;
        Ok(Self { file })
    }
}

impl FileHandle for OsFileHandle {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, Error> {
        // short reads (past EOF) are the caller's responsibility to detect
        Ok(self.file.read_at(buf, offset)?)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, Error> {
        self.file.write_at(buf, offset)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<(), Error> {
        Ok(self.file.sync_data()?)
    }
}

/// An in-memory [`FileHandle`], used by the crate's own test suite as a stand-in
/// for a real backend, the way `forest_db::MemoryDB` stands in for `RocksDb`.
#[derive(Debug, Default)]
pub struct MemFileHandle {
    data: RwLock<Vec<u8>>,
}

impl MemFileHandle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileHandle for MemFileHandle {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, Error> {
        let data = self.data.read();
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, Error> {
        let mut data = self.data.write();
        let offset = offset as usize;
        let end = offset + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> Result<(), Error> {
        Ok(())
    }
}
