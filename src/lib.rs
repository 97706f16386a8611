// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Foundation layer of a single-node database engine: a paged, checksummed,
//! single-file block store with an atomic checkpoint protocol, plus an
//! MVCC-style versioned catalog that names schemas and their tables/indexes.
//!
//! The block store ([`block_manager`], [`meta_block`]) and the catalog
//! ([`catalog`]) are independent today; the catalog will eventually be
//! persisted through the block store's meta-block stream, which is why
//! [`catalog::Catalog`] already carries a `meta_block` hook.

pub mod block_manager;
pub mod catalog;
mod constants;
mod error;
pub mod file_buffer;
pub mod file_handle;
mod hash;
pub mod meta_block;
mod metrics;

pub use block_manager::{Block, BlockId, BlockManager, DatabaseHeader, MasterHeader};
pub use catalog::{Catalog, CatalogEntryRef, CatalogSet, CreateSchemaInfo, EntryKind, SchemaEntry};
pub use constants::{
    BLOCK_SIZE, DATA_AREA_START, FILE_BUFFER_BLOCK_SIZE, FILE_BUFFER_HEADER_SIZE, HEADER_SIZE,
    VERSION_NUMBER,
};
pub use error::Error;
pub use file_buffer::FileBuffer;
pub use file_handle::{FileHandle, MemFileHandle, OsFileHandle};
pub use hash::checksum;
pub use meta_block::{MetaBlockReader, MetaBlockWriter};
