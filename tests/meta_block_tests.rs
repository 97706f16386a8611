// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod subtests;

use vectorbase_storage::{BlockManager, MemFileHandle, BLOCK_SIZE};

fn mem_manager() -> BlockManager {
    BlockManager::open_with_handle(Box::new(MemFileHandle::new()), true).unwrap()
}

/// Seed scenario 3: a stream spanning three pages (`2 * BLOCK_SIZE + 17` bytes)
/// round-trips byte for byte.
#[test]
fn spans_multiple_blocks() {
    let mut manager = mem_manager();
    let len = BLOCK_SIZE * 2 + 17;
    let data: Vec<u8> = (0..len).map(|i| ((i * 31) % 256) as u8).collect();
    subtests::meta_stream_round_trips(&mut manager, &data);
}

#[test]
fn fits_in_a_single_block() {
    let mut manager = mem_manager();
    subtests::meta_stream_round_trips(&mut manager, b"a small meta record");
}

/// A stream that lands exactly on a block boundary still chains correctly:
/// the writer must not emit a trailing empty block for an exact-fit write.
#[test]
fn exact_block_boundary() {
    let mut manager = mem_manager();
    // BLOCK_SIZE - 8 is the per-block payload capacity; the first 8 of those
    // bytes hold `next_block_id`, leaving BLOCK_SIZE - 16 for user data.
    let data = vec![0x5Au8; BLOCK_SIZE - 16];
    subtests::meta_stream_round_trips(&mut manager, &data);
}

/// Reading the free-list meta-stream format (`u64 count` then `count * BlockId`)
/// back out by hand, the way `BlockManager::open` does on recovery.
#[test]
fn reader_can_decode_free_list_payload_shape() {
    let mut manager = mem_manager();

    let root = {
        let mut writer = vectorbase_storage::MetaBlockWriter::open(&mut manager).unwrap();
        let root = writer.start_block_id();
        writer.write(&3u64.to_le_bytes()).unwrap();
        for id in [7u64, 8, 9] {
            writer.write(&id.to_le_bytes()).unwrap();
        }
        writer.close().unwrap();
        root
    };

    let mut reader = vectorbase_storage::MetaBlockReader::open(&mut manager, root).unwrap();
    let mut count_bytes = [0u8; 8];
    reader.read(&mut count_bytes).unwrap();
    assert_eq!(u64::from_le_bytes(count_bytes), 3);
    for expected in [7u64, 8, 9] {
        let mut id_bytes = [0u8; 8];
        reader.read(&mut id_bytes).unwrap();
        assert_eq!(u64::from_le_bytes(id_bytes), expected);
    }
}
