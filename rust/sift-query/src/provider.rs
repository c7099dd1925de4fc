//! Per-shard lookup providers consumed by the query processor.
//!
//! The providers hide the shard's storage layout: a [`WordLookup`] maps a term to its
//! posting list, a [`DocLookup`] maps a docid to a document name, and a
//! [`ShardOpener`] produces both for a shard path. Providers are stateful (they own
//! file handles whose cursors move on every lookup), hence the `&mut self` receivers
//! and the explicit `duplicate` operations.

use std::path::Path;

use sift_common::Result;

use crate::posting::{DocId, DocIdPosting};

/// Handle to one term's posting list within one shard.
///
/// Owned by the caller of [`WordLookup::lookup_word`] and released on drop.
pub trait PostingList: Send {
    /// Returns the (docid, rank) entries of the list, in stored order.
    ///
    /// The entries are not guaranteed to be sorted by docid.
    fn entries(&mut self) -> Result<Vec<DocIdPosting>>;
}

/// Term to posting-list lookup over a single shard.
pub trait WordLookup: Send {
    /// Looks up `term`, returning `None` if the shard does not contain it.
    fn lookup_word(&mut self, term: &str) -> Result<Option<Box<dyn PostingList>>>;

    /// Creates an independent provider over the same shard, with its own file
    /// handles.
    fn duplicate(&self) -> Result<Box<dyn WordLookup>>;
}

/// Docid to document-name lookup over a single shard.
pub trait DocLookup: Send {
    /// Resolves `docid` to its document name, or `None` if the shard does not know it.
    fn lookup_docid(&mut self, docid: DocId) -> Result<Option<String>>;

    /// Creates an independent provider over the same shard, with its own file
    /// handles.
    fn duplicate(&self) -> Result<Box<dyn DocLookup>>;
}

/// The pair of lookup providers serving one shard.
pub struct ShardReaders {
    pub docs: Box<dyn DocLookup>,
    pub words: Box<dyn WordLookup>,
}

impl ShardReaders {
    pub fn new(docs: Box<dyn DocLookup>, words: Box<dyn WordLookup>) -> ShardReaders {
        ShardReaders { docs, words }
    }

    /// Duplicates both providers.
    pub fn duplicate(&self) -> Result<ShardReaders> {
        Ok(ShardReaders {
            docs: self.docs.duplicate()?,
            words: self.words.duplicate()?,
        })
    }
}

/// Opens shards by path.
pub trait ShardOpener: Send + Sync {
    /// Opens the shard at `path`, checking its internal structure first when
    /// `validate` is set.
    ///
    /// # Errors
    ///
    /// Fails if the shard cannot be read, or if `validate` is set and the shard is
    /// structurally invalid.
    fn open(&self, path: &Path, validate: bool) -> Result<ShardReaders>;
}
