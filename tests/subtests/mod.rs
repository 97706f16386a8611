// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Shared assertion bodies run against a freshly opened [`BlockManager`],
//! a [`FileBuffer`], or a [`Catalog`], independent of which concrete
//! [`FileHandle`](vectorbase_storage::FileHandle) backend backs the manager
//! under test.

use vectorbase_storage::{
    Block, BlockId, BlockManager, Catalog, CreateSchemaInfo, DatabaseHeader, Error, FileBuffer,
    MetaBlockReader, MetaBlockWriter, BLOCK_SIZE,
};

/// Seed scenario 1: write a full page of `0xAA`, read it back, check `max_block`.
pub fn round_trip_page(manager: &mut BlockManager) {
    let mut block = manager.create_block();
    assert_eq!(block.id.as_u64(), 0);
    block.buffer.payload_mut().fill(0xAA);
    manager.write(&mut block).unwrap();

    let mut reread = Block {
        id: block.id,
        buffer: FileBuffer::new(BLOCK_SIZE),
    };
    manager.read(&mut reread).unwrap();
    assert_eq!(reread.buffer.payload(), block.buffer.payload());
    assert_eq!(manager.max_block(), 1);
}

/// P4: every id returned by `get_free_block_id` is either a bump of `max_block`
/// or a pop off the free list.
pub fn free_block_allocation_is_bump_or_pop(manager: &mut BlockManager) {
    let before = manager.max_block();
    let id = manager.get_free_block_id();
    assert_eq!(id.as_u64(), before);
    assert_eq!(manager.max_block(), before + 1);
}

/// P3 / seed scenario 4: two consecutive checkpoints strictly alternate the
/// active header, and the id freed by the first checkpoint is available for
/// reuse by the second (free_list correctly promoted from used_blocks).
pub fn checkpoint_alternates_and_recycles(manager: &mut BlockManager) {
    let mut block = manager.create_block();
    manager.write(&mut block).unwrap();
    manager.read(&mut block).unwrap();
    manager.write_header(DatabaseHeader::default()).unwrap();

    // the id freed by the first checkpoint (the only entry in `free_list`) is
    // popped here rather than bumping `max_block`.
    let recycled_id = block.id;
    let mut reused = manager.create_block();
    assert_eq!(reused.id, recycled_id);
    manager.write(&mut reused).unwrap();
    manager.read(&mut reused).unwrap();
    manager.write_header(DatabaseHeader::default()).unwrap();
}

/// P5: writing `S` bytes through a [`MetaBlockWriter`] and reading `S` bytes
/// back from a [`MetaBlockReader`] rooted at the writer's start block yields
/// the same sequence, including spans across multiple pages.
pub fn meta_stream_round_trips(manager: &mut BlockManager, data: &[u8]) {
    let root = {
        let mut writer = MetaBlockWriter::open(manager).unwrap();
        let root = writer.start_block_id();
        writer.write(data).unwrap();
        writer.close().unwrap();
        root
    };

    let mut out = vec![0u8; data.len()];
    let mut reader = MetaBlockReader::open(manager, root).unwrap();
    reader.read(&mut out).unwrap();
    assert_eq!(out, data);
}

/// P1/P2 against a real backing file: write a page, corrupt one payload byte
/// on disk, reopen, and confirm the read now fails with `ChecksumMismatch`.
pub fn checksum_mismatch_detected_on_reopen(path: &std::path::Path) {
    {
        let mut manager = BlockManager::open(path, true).unwrap();
        let mut block = manager.create_block();
        block.buffer.payload_mut().fill(0xAA);
        manager.write(&mut block).unwrap();
    }

    use std::io::{Read, Seek, SeekFrom, Write};
    let offset = vectorbase_storage::DATA_AREA_START + 100;
    let mut file = std::fs::OpenOptions::new().read(true).write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[byte[0] ^ 0xFF]).unwrap();
    drop(file);

    let mut manager = BlockManager::open(path, false).unwrap();
    let mut block = Block {
        id: BlockId(0),
        buffer: FileBuffer::new(BLOCK_SIZE),
    };
    let err = manager.read(&mut block).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch));
}

/// Seed scenario 5: create/drop/create on a schema name yields a head distinct
/// from the first creation, reachable through a tombstone via `next`.
pub fn catalog_create_drop_create_cycles(catalog: &mut Catalog) {
    let info = |name: &str| CreateSchemaInfo {
        name: name.to_string(),
        if_not_exists: false,
    };

    catalog.create_schema(info("s")).unwrap();
    let first_id = catalog.get_schema("s").unwrap().id();

    catalog.drop_schema("s").unwrap();
    assert!(catalog.get_schema("s").is_none());

    catalog.create_schema(info("s")).unwrap();
    let second = catalog.get_schema("s").unwrap();
    assert_ne!(second.id(), first_id);

    let tombstone = second.next().expect("head has a next link");
    assert!(tombstone.deleted());
    let original = tombstone.next().expect("tombstone has a next link");
    assert_eq!(original.id(), first_id);
}

/// Seed scenario 6: `main` is protected, and an unrelated schema is unaffected
/// by the protection check.
pub fn default_schema_is_protected(catalog: &mut Catalog) {
    let err = catalog.drop_schema(vectorbase_storage::catalog::DEFAULT_SCHEMA).unwrap_err();
    assert!(matches!(err, Error::ProtectedSchema));
    assert!(catalog.get_schema(vectorbase_storage::catalog::DEFAULT_SCHEMA).is_some());

    catalog
        .create_schema(CreateSchemaInfo { name: "other".into(), if_not_exists: false })
        .unwrap();
    catalog.drop_schema("other").unwrap();
    assert!(catalog.get_schema("other").is_none());
}
