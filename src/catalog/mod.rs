// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Root of a two-level namespace: schemas, each owning its own `tables` and
//! `indexes` sub-namespaces. Every operation here is a pure in-memory
//! mutation; persistence through the meta-block stream is a future extension
//! this module exposes hooks for ([`Catalog::meta_block`]) but does not
//! implement.

mod catalog_set;

pub use catalog_set::{CatalogEntryRef, CatalogSet, EntryKind};

use crate::block_manager::BlockId;
use crate::error::Error;

/// Name of the schema that can never be dropped.
pub const DEFAULT_SCHEMA: &str = "main";

/// The external collaborator descriptor a DDL parser (out of scope) would
/// build and hand to [`Catalog::create_schema`].
#[derive(Debug, Clone)]
pub struct CreateSchemaInfo {
    pub name: String,
    pub if_not_exists: bool,
}

/// A schema's own table and index namespaces. `tables`/`indexes` entries
/// carry no payload beyond the version-chain bookkeeping itself.
#[derive(Default)]
pub struct SchemaEntry {
    pub tables: CatalogSet<()>,
    pub indexes: CatalogSet<()>,
}

/// Root of the catalog's namespace: one version-chained set of schemas.
pub struct Catalog {
    schemas: CatalogSet<SchemaEntry>,
    /// Root block of the persisted catalog stream, once a higher layer has
    /// flushed one through a `MetaBlockWriter`. Not read or written here.
    meta_block: Option<BlockId>,
}

impl Catalog {
    pub fn create() -> Self {
        let mut schemas = CatalogSet::new();
        schemas
            .create_entry(DEFAULT_SCHEMA, EntryKind::Schema, SchemaEntry::default())
            .expect("a fresh catalog has no prior entry for the default schema");
        Self {
            schemas,
            meta_block: None,
        }
    }

    /// Root block of the persisted catalog/metadata stream, if one has been
    /// recorded via [`Self::set_meta_block`].
    pub fn meta_block(&self) -> Option<BlockId> {
        self.meta_block
    }

    /// Records the meta-stream root a higher layer flushed this catalog
    /// through, for inclusion in the next [`crate::block_manager::DatabaseHeader`].
    pub fn set_meta_block(&mut self, block: BlockId) {
        self.meta_block = Some(block);
    }

    pub fn create_schema(&mut self, info: CreateSchemaInfo) -> Result<(), Error> {
        match self
            .schemas
            .create_entry(&info.name, EntryKind::Schema, SchemaEntry::default())
        {
            Ok(()) => Ok(()),
            Err(Error::AlreadyExists) if info.if_not_exists => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn get_schema(&self, name: &str) -> Option<CatalogEntryRef<'_, SchemaEntry>> {
        self.schemas.get_entry(name)
    }

    pub fn drop_schema(&mut self, name: &str) -> Result<(), Error> {
        if name == DEFAULT_SCHEMA {
            return Err(Error::ProtectedSchema);
        }
        if !self.schemas.drop_entry(name) {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::create()
    }
}
