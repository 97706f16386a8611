// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! A byte-stream abstraction over a chain of [`BLOCK_SIZE`]-sized pages, each
//! payload-prefixed with the id of its successor. Both directions are
//! single-pass: a writer only ever appends, a reader only ever advances.

use crate::block_manager::{Block, BlockId, BlockManager};
use crate::constants::BLOCK_SIZE;
use crate::error::Error;

const NEXT_ID_SIZE: usize = 8;

/// Appends a byte stream to a chain of blocks allocated from a [`BlockManager`].
pub struct MetaBlockWriter<'a> {
    manager: &'a mut BlockManager,
    block: Block,
    offset: usize,
}

impl<'a> MetaBlockWriter<'a> {
    pub fn open(manager: &'a mut BlockManager) -> Result<Self, Error> {
        let block = manager.create_block();
        Ok(Self {
            manager,
            block,
            offset: NEXT_ID_SIZE,
        })
    }

    /// Id of the first block of the chain, the root a reader is later opened against.
    pub fn start_block_id(&self) -> BlockId {
        self.block.id
    }

    pub fn write(&mut self, mut buf: &[u8]) -> Result<(), Error> {
        while self.offset + buf.len() > self.block.buffer.payload_len() {
            let cap = self.block.buffer.payload_len();
            let fit = cap - self.offset;
            if fit > 0 {
                self.block.buffer.payload_mut()[self.offset..cap].copy_from_slice(&buf[..fit]);
                buf = &buf[fit..];
            }
            self.offset = cap;

            let new_id = self.manager.get_free_block_id();
            self.block.buffer.payload_mut()[..NEXT_ID_SIZE]
                .copy_from_slice(&new_id.as_u64().to_le_bytes());
            self.flush()?;
            self.block.id = new_id;
        }
        let offset = self.offset;
        self.block.buffer.payload_mut()[offset..offset + buf.len()].copy_from_slice(buf);
        self.offset += buf.len();
        Ok(())
    }

    /// Writes the current block if any user data has been written to it since
    /// the last flush. A no-op otherwise.
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.offset > NEXT_ID_SIZE {
            self.manager.write(&mut self.block)?;
            self.offset = NEXT_ID_SIZE;
        }
        Ok(())
    }

    /// The final block's next-id slot is left as-is; callers read this chain
    /// by trusting a serialized length prefix, never by walking past it.
    pub fn close(mut self) -> Result<(), Error> {
        self.flush()
    }
}

impl Drop for MetaBlockWriter<'_> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Reads a byte stream previously written by a [`MetaBlockWriter`].
pub struct MetaBlockReader<'a> {
    manager: &'a mut BlockManager,
    block: Block,
    offset: usize,
    next_block_id: BlockId,
}

impl<'a> MetaBlockReader<'a> {
    pub fn open(manager: &'a mut BlockManager, root_id: BlockId) -> Result<Self, Error> {
        let mut block = Block {
            id: root_id,
            buffer: crate::file_buffer::FileBuffer::new(BLOCK_SIZE),
        };
        manager.read(&mut block)?;
        let next_block_id = BlockId(u64::from_le_bytes(
            block.buffer.payload()[..NEXT_ID_SIZE].try_into().unwrap(),
        ));
        Ok(Self {
            manager,
            block,
            offset: NEXT_ID_SIZE,
            next_block_id,
        })
    }

    pub fn read(&mut self, mut buf: &mut [u8]) -> Result<(), Error> {
        while self.offset + buf.len() > self.block.buffer.payload_len() {
            let cap = self.block.buffer.payload_len();
            let avail = cap - self.offset;
            if avail > 0 {
                let (head, rest) = buf.split_at_mut(avail);
                head.copy_from_slice(&self.block.buffer.payload()[self.offset..cap]);
                buf = rest;
            }
            if !self.next_block_id.is_valid() {
                return Err(Error::CorruptDatabase);
            }
            self.block.id = self.next_block_id;
            self.manager.read(&mut self.block)?;
            self.next_block_id = BlockId(u64::from_le_bytes(
                self.block.buffer.payload()[..NEXT_ID_SIZE].try_into().unwrap(),
            ));
            self.offset = NEXT_ID_SIZE;
        }
        let offset = self.offset;
        let len = buf.len();
        buf.copy_from_slice(&self.block.buffer.payload()[offset..offset + len]);
        self.offset += len;
        Ok(())
    }

    pub fn close(self) {}
}
