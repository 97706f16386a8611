// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Storage-core error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("master header version mismatch")]
    VersionMismatch,
    #[error("both database headers are corrupt")]
    CorruptDatabase,
    #[error("entry already exists")]
    AlreadyExists,
    #[error("entry not found")]
    NotFound,
    #[error("cannot drop the protected default schema")]
    ProtectedSchema,
    #[error("{0}")]
    Other(String),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use Error::*;

        match (self, other) {
            (&OutOfMemory, &OutOfMemory) => true,
            (&IoError(_), &IoError(_)) => true,
            (&ChecksumMismatch, &ChecksumMismatch) => true,
            (&VersionMismatch, &VersionMismatch) => true,
            (&CorruptDatabase, &CorruptDatabase) => true,
            (&AlreadyExists, &AlreadyExists) => true,
            (&NotFound, &NotFound) => true,
            (&ProtectedSchema, &ProtectedSchema) => true,
            (&Other(ref a), &Other(ref b)) => a == b,
            _ => false,
        }
    }
}

impl From<Error> for String {
    fn from(e: Error) -> Self {
        e.to_string()
    }
}
