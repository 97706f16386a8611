// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// On-disk format version. Bumping this invalidates every existing database file.
pub const VERSION_NUMBER: u64 = 1;

/// Size in bytes of each of the three fixed header regions (MasterHeader, DatabaseHeader x2).
pub const HEADER_SIZE: usize = 4096;

/// Size in bytes of a data page, checksum header included.
pub const BLOCK_SIZE: usize = 262_144;

/// Alignment unit a [`crate::file_buffer::FileBuffer`]'s payload start is guaranteed to satisfy.
pub const FILE_BUFFER_BLOCK_SIZE: usize = 4096;

/// Size in bytes of the checksum slot at the front of every [`crate::file_buffer::FileBuffer`].
pub const FILE_BUFFER_HEADER_SIZE: usize = 8;

/// Byte offset at which the data region (page 0) begins.
pub const DATA_AREA_START: u64 = (3 * HEADER_SIZE) as u64;
