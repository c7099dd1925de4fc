//! In-memory shard lookup providers.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use ahash::AHashMap;
use sift_common::{Result, error::Error};
use sift_query::{
    DocId, DocIdPosting, DocLookup, PostingList, Rank, ShardOpener, ShardReaders, WordLookup,
};

/// Words, postings and documents of one in-memory shard.
#[derive(Debug, Clone, Default)]
pub struct MemoryShard {
    words: AHashMap<String, Vec<DocIdPosting>>,
    docs: AHashMap<DocId, String>,
}

impl MemoryShard {
    pub fn new() -> MemoryShard {
        Default::default()
    }

    /// Registers a document name.
    pub fn document(mut self, docid: DocId, name: impl Into<String>) -> Self {
        self.docs.insert(docid, name.into());
        self
    }

    /// Appends `(docid, rank)` to the posting list of `word`.
    pub fn posting(mut self, word: impl Into<String>, docid: DocId, rank: Rank) -> Self {
        self.words
            .entry(word.into())
            .or_default()
            .push(DocIdPosting::new(docid, rank));
        self
    }

    /// Registers `word` with an empty posting list.
    pub fn empty_word(mut self, word: impl Into<String>) -> Self {
        self.words.entry(word.into()).or_default();
        self
    }

    pub fn readers(&self) -> ShardReaders {
        let shard = Arc::new(self.clone());
        ShardReaders::new(
            Box::new(MemoryDocLookup {
                shard: Arc::clone(&shard),
            }),
            Box::new(MemoryWordLookup { shard }),
        )
    }
}

struct MemoryDocLookup {
    shard: Arc<MemoryShard>,
}

impl DocLookup for MemoryDocLookup {
    fn lookup_docid(&mut self, docid: DocId) -> Result<Option<String>> {
        Ok(self.shard.docs.get(&docid).cloned())
    }

    fn duplicate(&self) -> Result<Box<dyn DocLookup>> {
        Ok(Box::new(MemoryDocLookup {
            shard: Arc::clone(&self.shard),
        }))
    }
}

struct MemoryWordLookup {
    shard: Arc<MemoryShard>,
}

impl WordLookup for MemoryWordLookup {
    fn lookup_word(&mut self, term: &str) -> Result<Option<Box<dyn PostingList>>> {
        Ok(self.shard.words.get(term).map(|entries| {
            Box::new(MemoryPostingList {
                entries: entries.clone(),
            }) as Box<dyn PostingList>
        }))
    }

    fn duplicate(&self) -> Result<Box<dyn WordLookup>> {
        Ok(Box::new(MemoryWordLookup {
            shard: Arc::clone(&self.shard),
        }))
    }
}

struct MemoryPostingList {
    entries: Vec<DocIdPosting>,
}

impl PostingList for MemoryPostingList {
    fn entries(&mut self) -> Result<Vec<DocIdPosting>> {
        Ok(self.entries.clone())
    }
}

/// [`ShardOpener`] serving [`MemoryShard`]s registered under paths.
///
/// Every `open` call is recorded together with its `validate` flag. Paths listed
/// with [`MemoryShardOpener::invalid`] fail when opened with validation.
#[derive(Default)]
pub struct MemoryShardOpener {
    shards: AHashMap<PathBuf, MemoryShard>,
    invalid: Vec<PathBuf>,
    opened: Mutex<Vec<(PathBuf, bool)>>,
}

impl MemoryShardOpener {
    pub fn new() -> MemoryShardOpener {
        Default::default()
    }

    pub fn shard(mut self, path: impl Into<PathBuf>, shard: MemoryShard) -> Self {
        self.shards.insert(path.into(), shard);
        self
    }

    /// Marks `path` as structurally invalid.
    pub fn invalid(mut self, path: impl Into<PathBuf>) -> Self {
        self.invalid.push(path.into());
        self
    }

    /// `(path, validate)` of every `open` call so far, in call order.
    pub fn opened(&self) -> Vec<(PathBuf, bool)> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl ShardOpener for MemoryShardOpener {
    fn open(&self, path: &Path, validate: bool) -> Result<ShardReaders> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push((path.to_path_buf(), validate));
        }
        let shard = self.shards.get(path).ok_or_else(|| {
            Error::io(
                path.display().to_string(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })?;
        if validate && self.invalid.iter().any(|p| p == path) {
            return Err(Error::corrupt_index(
                path.display().to_string(),
                "shard failed validation",
            ));
        }
        Ok(shard.readers())
    }
}
