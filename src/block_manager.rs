// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Allocator and reader/writer of fixed-size pages over a [`FileHandle`],
//! with free-list accounting and an atomic dual-header checkpoint.

use std::path::Path;

use crate::constants::{DATA_AREA_START, BLOCK_SIZE, HEADER_SIZE, VERSION_NUMBER};
use crate::error::Error;
use crate::file_buffer::FileBuffer;
use crate::file_handle::{FileHandle, OsFileHandle};

/// A 64-bit page identifier. `INVALID` is a sentinel disjoint from every id a
/// [`BlockManager`] will ever hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u64);

impl BlockId {
    pub const INVALID: BlockId = BlockId(u64::MAX);

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A page buffer exclusively owned by whoever allocated it (`create_block`,
/// `read`, or the meta-stream reader/writer that needs scratch space).
#[derive(Debug)]
pub struct Block {
    pub id: BlockId,
    pub buffer: FileBuffer,
}

/// Payload of the once-written, on-open-validated first header region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterHeader {
    pub version: u64,
    pub reserved: [u64; 4],
}

/// Payload of one of the two alternating checkpoint header slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHeader {
    pub iteration: u64,
    pub meta_block: BlockId,
    pub free_list_id: BlockId,
    pub block_count: u64,
}

impl Default for DatabaseHeader {
    fn default() -> Self {
        Self {
            iteration: 0,
            meta_block: BlockId::INVALID,
            free_list_id: BlockId::INVALID,
            block_count: 0,
        }
    }
}

fn encode_master_header(buf: &mut FileBuffer, header: &MasterHeader) {
    let payload = buf.payload_mut();
    payload[0..8].copy_from_slice(&header.version.to_le_bytes());
    for (i, word) in header.reserved.iter().enumerate() {
        let start = 8 + i * 8;
        payload[start..start + 8].copy_from_slice(&word.to_le_bytes());
    }
}

fn decode_master_header(buf: &FileBuffer) -> MasterHeader {
    let payload = buf.payload();
    let version = u64::from_le_bytes(payload[0..8].try_into().unwrap());
    let mut reserved = [0u64; 4];
    for (i, word) in reserved.iter_mut().enumerate() {
        let start = 8 + i * 8;
        *word = u64::from_le_bytes(payload[start..start + 8].try_into().unwrap());
    }
    MasterHeader { version, reserved }
}

fn encode_database_header(buf: &mut FileBuffer, header: &DatabaseHeader) {
    let payload = buf.payload_mut();
    payload[0..8].copy_from_slice(&header.iteration.to_le_bytes());
    payload[8..16].copy_from_slice(&header.meta_block.as_u64().to_le_bytes());
    payload[16..24].copy_from_slice(&header.free_list_id.as_u64().to_le_bytes());
    payload[24..32].copy_from_slice(&header.block_count.to_le_bytes());
}

fn decode_database_header(buf: &FileBuffer) -> DatabaseHeader {
    let payload = buf.payload();
    DatabaseHeader {
        iteration: u64::from_le_bytes(payload[0..8].try_into().unwrap()),
        meta_block: BlockId(u64::from_le_bytes(payload[8..16].try_into().unwrap())),
        free_list_id: BlockId(u64::from_le_bytes(payload[16..24].try_into().unwrap())),
        block_count: u64::from_le_bytes(payload[24..32].try_into().unwrap()),
    }
}

/// Reads the database header at `offset`, distinguishing a checksum failure
/// (header slot not currently valid) from every other I/O error.
fn try_read_database_header(
    handle: &dyn FileHandle,
    scratch: &mut FileBuffer,
    offset: u64,
) -> Result<Option<DatabaseHeader>, Error> {
    match scratch.read(handle, offset) {
        Ok(()) => Ok(Some(decode_database_header(scratch))),
        Err(Error::ChecksumMismatch) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Allocator + reader/writer of fixed-size pages over a single [`FileHandle`].
/// Owns the free list, the used-set, and the dual-header checkpoint.
pub struct BlockManager {
    file_handle: Box<dyn FileHandle>,
    header_buffer: FileBuffer,
    /// Index (0 or 1) of the DatabaseHeader slot that is currently active.
    active_header: u8,
    iteration_count: u64,
    max_block: u64,
    meta_block: BlockId,
    free_list: Vec<BlockId>,
    used_blocks: Vec<BlockId>,
}

impl BlockManager {
    /// Opens (or creates) a single-file database backed by an OS file at `path`.
    pub fn open(path: impl AsRef<Path>, create_new: bool) -> Result<Self, Error> {
        let handle = OsFileHandle::open(path, create_new)?;
        Self::open_with_handle(Box::new(handle), create_new)
    }

    /// Opens (or creates) a database over an arbitrary [`FileHandle`] backend,
    /// e.g. [`crate::file_handle::MemFileHandle`] in tests.
    pub fn open_with_handle(handle: Box<dyn FileHandle>, create_new: bool) -> Result<Self, Error> {
        let mut header_buffer = FileBuffer::new(HEADER_SIZE);

        if create_new {
            header_buffer.clear();
            encode_master_header(
                &mut header_buffer,
                &MasterHeader {
                    version: VERSION_NUMBER,
                    reserved: [0; 4],
                },
            );
            header_buffer.write(handle.as_ref(), 0)?;

            header_buffer.clear();
            encode_database_header(&mut header_buffer, &DatabaseHeader::default());
            header_buffer.write(handle.as_ref(), HEADER_SIZE as u64)?;

            header_buffer.clear();
            encode_database_header(
                &mut header_buffer,
                &DatabaseHeader {
                    iteration: 1,
                    ..DatabaseHeader::default()
                },
            );
            header_buffer.write(handle.as_ref(), (HEADER_SIZE * 2) as u64)?;
            handle.sync()?;

            tracing::info!("created fresh database");

            let mut manager = Self {
                file_handle: handle,
                header_buffer,
                active_header: 1,
                iteration_count: 1,
                max_block: 0,
                meta_block: BlockId::INVALID,
                free_list: Vec::new(),
                used_blocks: Vec::new(),
            };
            manager.publish_metrics();
            Ok(manager)
        } else {
            header_buffer.clear();
            header_buffer.read(handle.as_ref(), 0)?;
            let master = decode_master_header(&header_buffer);
            if master.version != VERSION_NUMBER {
                return Err(Error::VersionMismatch);
            }

            let h1 = try_read_database_header(handle.as_ref(), &mut header_buffer, HEADER_SIZE as u64)?;
            let h2 =
                try_read_database_header(handle.as_ref(), &mut header_buffer, (HEADER_SIZE * 2) as u64)?;

            let (active_header, active) = match (h1, h2) {
                (Some(h1), Some(h2)) if h1.iteration > h2.iteration => (0u8, h1),
                (Some(_), Some(h2)) => (1u8, h2),
                (Some(h1), None) => {
                    tracing::warn!("database header 2 failed checksum verification");
                    (0u8, h1)
                }
                (None, Some(h2)) => {
                    tracing::warn!("database header 1 failed checksum verification");
                    (1u8, h2)
                }
                (None, None) => return Err(Error::CorruptDatabase),
            };

            let mut manager = Self {
                file_handle: handle,
                header_buffer,
                active_header,
                iteration_count: active.iteration,
                max_block: active.block_count,
                meta_block: active.meta_block,
                free_list: Vec::new(),
                used_blocks: Vec::new(),
            };

            if active.free_list_id.is_valid() {
                manager.load_free_list(active.free_list_id)?;
            }

            tracing::info!(
                iteration = manager.iteration_count,
                active_header,
                "recovered database"
            );
            manager.publish_metrics();
            Ok(manager)
        }
    }

    fn load_free_list(&mut self, root: BlockId) -> Result<(), Error> {
        let mut reader = crate::meta_block::MetaBlockReader::open(self, root)?;
        let mut count_bytes = [0u8; 8];
        reader.read(&mut count_bytes)?;
        let count = u64::from_le_bytes(count_bytes);
        let mut free_list = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut id_bytes = [0u8; 8];
            reader.read(&mut id_bytes)?;
            free_list.push(BlockId(u64::from_le_bytes(id_bytes)));
        }
        self.free_list = free_list;
        Ok(())
    }

    fn publish_metrics(&self) {
        crate::metrics::MAX_BLOCK.set(self.max_block as f64);
        crate::metrics::FREE_LIST_LEN.set(self.free_list.len() as f64);
        crate::metrics::USED_BLOCKS_LEN.set(self.used_blocks.len() as f64);
    }

    /// Block id of the persisted metadata stream root, or `None` if never set.
    pub fn meta_block(&self) -> Option<BlockId> {
        self.meta_block.is_valid().then_some(self.meta_block)
    }

    pub fn max_block(&self) -> u64 {
        self.max_block
    }

    /// Pops the tail of the free list, else bumps `max_block`.
    pub fn get_free_block_id(&mut self) -> BlockId {
        let id = self.free_list.pop().unwrap_or_else(|| {
            let id = BlockId(self.max_block);
            self.max_block += 1;
            id
        });
        crate::metrics::FREE_LIST_LEN.set(self.free_list.len() as f64);
        crate::metrics::MAX_BLOCK.set(self.max_block as f64);
        id
    }

    /// Allocates a fresh id and a fresh [`FileBuffer`].
    pub fn create_block(&mut self) -> Block {
        let id = self.get_free_block_id();
        Block {
            id,
            buffer: FileBuffer::new(BLOCK_SIZE),
        }
    }

    fn block_offset(id: BlockId) -> u64 {
        DATA_AREA_START + id.as_u64() * BLOCK_SIZE as u64
    }

    /// Populates `block.buffer` from disk and records `block.id` as touched
    /// since the last checkpoint (eligible for recycling on the next one).
    pub fn read(&mut self, block: &mut Block) -> Result<(), Error> {
        block.buffer.read(self.file_handle.as_ref(), Self::block_offset(block.id))?;
        self.used_blocks.push(block.id);
        crate::metrics::USED_BLOCKS_LEN.set(self.used_blocks.len() as f64);
        Ok(())
    }

    /// Writes `block.buffer` to disk. Does not record `block.id` as used.
    pub fn write(&self, block: &mut Block) -> Result<(), Error> {
        block.buffer.write(self.file_handle.as_ref(), Self::block_offset(block.id))
    }

    fn file_handle(&self) -> &dyn FileHandle {
        self.file_handle.as_ref()
    }

    /// Atomically commits `header` (with `iteration`, `block_count`, and
    /// `free_list_id` filled in here) to the alternate header slot, then
    /// promotes `used_blocks` to `free_list` for the next epoch.
    ///
    /// On any I/O failure, `active_header`/`free_list`/`used_blocks` are left
    /// exactly as they were before the call.
    pub fn write_header(&mut self, mut header: DatabaseHeader) -> Result<(), Error> {
        let started = std::time::Instant::now();
        let result = self.write_header_inner(&mut header);
        crate::metrics::CHECKPOINT_DURATION.observe(started.elapsed().as_secs_f64());
        result
    }

    fn write_header_inner(&mut self, header: &mut DatabaseHeader) -> Result<(), Error> {
        let new_iteration = self.iteration_count + 1;
        header.iteration = new_iteration;
        header.block_count = self.max_block;

        let recycled = self.used_blocks.clone();
        if recycled.is_empty() {
            header.free_list_id = BlockId::INVALID;
        } else {
            let count = recycled.len() as u64;
            let mut writer = crate::meta_block::MetaBlockWriter::open(self)?;
            header.free_list_id = writer.start_block_id();
            writer.write(&count.to_le_bytes())?;
            for id in &recycled {
                writer.write(&id.as_u64().to_le_bytes())?;
            }
            writer.flush()?;
        }

        self.header_buffer.clear();
        encode_database_header(&mut self.header_buffer, &*header);
        let alternate_offset = if self.active_header == 1 {
            HEADER_SIZE as u64
        } else {
            (HEADER_SIZE * 2) as u64
        };
        self.header_buffer.write(self.file_handle(), alternate_offset)?;
        self.file_handle.sync()?;

        // Durability point passed: commit the in-memory state. `used_blocks`
        // is moved, not aliased, into `free_list`.
        self.iteration_count = new_iteration;
        self.meta_block = header.meta_block;
        self.active_header = 1 - self.active_header;
        self.free_list = std::mem::take(&mut self.used_blocks);
        self.publish_metrics();

        tracing::debug!(
            iteration = new_iteration,
            recycled = recycled.len(),
            "checkpoint committed"
        );
        Ok(())
    }
}
