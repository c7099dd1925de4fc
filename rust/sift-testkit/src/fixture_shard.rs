//! A small on-disk shard format used to exercise the read path end to end.
//!
//! ```text
//! 0   magic: u32 = FIXTURE_MAGIC
//! 4   doc table offset: u32
//! 8   word table offset: u32
//! ..  doc table   (bucket-chain hash table keyed by docid)
//! ..  word table  (bucket-chain hash table keyed by xxh3_64(word))
//! ```
//!
//! Doc element: `docid: u64, name_len: u16, name bytes`.
//! Word element: `word_len: u16, posting_count: u32, word bytes,
//! posting_count x (docid: u64, rank: u32)`.
//!
//! All integers are big-endian.

use std::{
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use sift_common::{Result, error::Error};
use sift_hashtable::{HashKey, HashTableReader};
use sift_io::{FileSource, IndexSource};
use sift_query::{
    DocId, DocIdPosting, DocLookup, PostingList, Rank, ShardOpener, ShardReaders, WordLookup,
};
use xxhash_rust::xxh3::xxh3_64;

use crate::table_image::HashTableImage;

pub const FIXTURE_MAGIC: u32 = 0x5346_5431;

const HEADER_LEN: usize = 12;
const WORD_ELEMENT_HEADER_LEN: u64 = 6;

/// Hash key of a word in the word table.
pub fn word_key(word: &str) -> HashKey {
    xxh3_64(word.as_bytes())
}

/// Builder of fixture shard images.
pub struct FixtureShardBuilder {
    num_buckets: u32,
    docs: Vec<(DocId, String)>,
    words: Vec<(String, Vec<DocIdPosting>)>,
}

impl FixtureShardBuilder {
    /// Both tables get `num_buckets` buckets.
    pub fn new(num_buckets: u32) -> FixtureShardBuilder {
        FixtureShardBuilder {
            num_buckets,
            docs: Vec::new(),
            words: Vec::new(),
        }
    }

    pub fn document(mut self, docid: DocId, name: impl Into<String>) -> Self {
        self.docs.push((docid, name.into()));
        self
    }

    /// Appends `(docid, rank)` to the posting list of `word`.
    pub fn posting(mut self, word: &str, docid: DocId, rank: Rank) -> Self {
        let posting = DocIdPosting::new(docid, rank);
        match self.words.iter_mut().find(|(w, _)| w == word) {
            Some((_, postings)) => postings.push(posting),
            None => self.words.push((word.to_string(), vec![posting])),
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut docs = HashTableImage::new(self.num_buckets);
        for (docid, name) in &self.docs {
            let name_len: u16 = length_field(name.len(), "document name");
            let mut element = Vec::new();
            element.extend_from_slice(&docid.to_be_bytes());
            element.extend_from_slice(&name_len.to_be_bytes());
            element.extend_from_slice(name.as_bytes());
            docs.insert(*docid, element);
        }

        let mut words = HashTableImage::new(self.num_buckets);
        for (word, postings) in &self.words {
            let word_len: u16 = length_field(word.len(), "word");
            let count: u32 = length_field(postings.len(), "posting list");
            let mut element = Vec::new();
            element.extend_from_slice(&word_len.to_be_bytes());
            element.extend_from_slice(&count.to_be_bytes());
            element.extend_from_slice(word.as_bytes());
            for posting in postings {
                element.extend_from_slice(&posting.docid.to_be_bytes());
                element.extend_from_slice(&posting.rank.to_be_bytes());
            }
            words.insert(word_key(word), element);
        }

        let mut out = vec![0u8; HEADER_LEN];
        let doc_table = docs.write_to(&mut out);
        let word_table = words.write_to(&mut out);
        BigEndian::write_u32(&mut out[0..4], FIXTURE_MAGIC);
        BigEndian::write_u32(&mut out[4..8], doc_table.offset as u32);
        BigEndian::write_u32(&mut out[8..12], word_table.offset as u32);
        out
    }

    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// # Panics
///
/// If `len` does not fit the on-disk length field.
fn length_field<T: TryFrom<usize>>(len: usize, what: &str) -> T {
    match T::try_from(len) {
        Ok(len) => len,
        Err(_) => panic!("{what} length {len} does not fit its length field"),
    }
}

/// Writes every builder to `shard-{i}.idx` inside a fresh temporary directory.
///
/// The directory (and the shards) are removed when the returned `TempDir` drops.
pub fn write_temp_shards(
    builders: &[FixtureShardBuilder],
) -> std::io::Result<(tempfile::TempDir, Vec<PathBuf>)> {
    let dir = tempfile::tempdir()?;
    let paths = builders
        .iter()
        .enumerate()
        .map(|(i, builder)| {
            let path = dir.path().join(format!("shard-{i}.idx"));
            builder.write(&path).map(|_| path)
        })
        .collect::<std::io::Result<Vec<_>>>()?;
    Ok((dir, paths))
}

/// Opens the fixture shard stored in `source`.
///
/// The two tables get their own duplicated handles. With `validate`, every bucket
/// chain of both tables is checked against the source size.
pub fn open_fixture<S>(mut source: S, validate: bool) -> Result<ShardReaders>
where
    S: IndexSource + 'static,
{
    let mut header = [0u8; HEADER_LEN];
    source
        .seek(SeekFrom::Start(0))
        .and_then(|_| source.read_exact(&mut header))
        .map_err(|e| Error::io("fixture shard header", e))?;
    if BigEndian::read_u32(&header[0..4]) != FIXTURE_MAGIC {
        return Err(Error::corrupt_index("fixture shard header", "bad magic"));
    }
    let doc_offset = BigEndian::read_u32(&header[4..8]) as u64;
    let word_offset = BigEndian::read_u32(&header[8..12]) as u64;

    let doc_source = source
        .duplicate()
        .map_err(|e| Error::io("duplicate fixture shard", e))?;
    let mut docs = HashTableReader::open(doc_source, doc_offset)?;
    let mut words = HashTableReader::open(source, word_offset)?;
    if validate {
        docs.validate()?;
        words.validate()?;
    }
    Ok(ShardReaders::new(
        Box::new(FixtureDocLookup { table: docs }),
        Box::new(FixtureWordLookup { table: words }),
    ))
}

/// [`ShardOpener`] for fixture shard files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureShardOpener;

impl ShardOpener for FixtureShardOpener {
    fn open(&self, path: &Path, validate: bool) -> Result<ShardReaders> {
        let source =
            FileSource::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        open_fixture(source, validate)
    }
}

struct FixtureDocLookup<S> {
    table: HashTableReader<S>,
}

impl<S: IndexSource + 'static> DocLookup for FixtureDocLookup<S> {
    fn lookup_docid(&mut self, docid: DocId) -> Result<Option<String>> {
        let positions = self.table.lookup_positions(docid)?;
        let source = self.table.source_mut();
        for position in positions {
            source
                .seek(SeekFrom::Start(position as u64))
                .map_err(|e| Error::io("doc element", e))?;
            let stored = source
                .read_u64::<BigEndian>()
                .map_err(|e| Error::io("doc element", e))?;
            if stored != docid {
                continue;
            }
            let name_len = source
                .read_u16::<BigEndian>()
                .map_err(|e| Error::io("doc element", e))?;
            let mut name = vec![0u8; name_len as usize];
            source
                .read_exact(&mut name)
                .map_err(|e| Error::io("doc element", e))?;
            let name = String::from_utf8(name)
                .map_err(|_| Error::corrupt_index("doc element", "name is not utf-8"))?;
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn duplicate(&self) -> Result<Box<dyn DocLookup>> {
        Ok(Box::new(FixtureDocLookup {
            table: self.table.try_clone()?,
        }))
    }
}

struct FixtureWordLookup<S> {
    table: HashTableReader<S>,
}

impl<S: IndexSource + 'static> WordLookup for FixtureWordLookup<S> {
    fn lookup_word(&mut self, term: &str) -> Result<Option<Box<dyn PostingList>>> {
        let positions = self.table.lookup_positions(word_key(term))?;
        let source = self.table.source_mut();
        for position in positions {
            source
                .seek(SeekFrom::Start(position as u64))
                .map_err(|e| Error::io("word element", e))?;
            let word_len = source
                .read_u16::<BigEndian>()
                .map_err(|e| Error::io("word element", e))?;
            let count = source
                .read_u32::<BigEndian>()
                .map_err(|e| Error::io("word element", e))?;
            let mut word = vec![0u8; word_len as usize];
            source
                .read_exact(&mut word)
                .map_err(|e| Error::io("word element", e))?;
            if word != term.as_bytes() {
                continue;
            }
            let list = FixturePostingList {
                source: source
                    .duplicate()
                    .map_err(|e| Error::io("duplicate word table", e))?,
                offset: position as u64 + WORD_ELEMENT_HEADER_LEN + word_len as u64,
                count,
            };
            return Ok(Some(Box::new(list)));
        }
        Ok(None)
    }

    fn duplicate(&self) -> Result<Box<dyn WordLookup>> {
        Ok(Box::new(FixtureWordLookup {
            table: self.table.try_clone()?,
        }))
    }
}

struct FixturePostingList<S> {
    source: S,
    offset: u64,
    count: u32,
}

impl<S: IndexSource + 'static> PostingList for FixturePostingList<S> {
    fn entries(&mut self) -> Result<Vec<DocIdPosting>> {
        self.source
            .seek(SeekFrom::Start(self.offset))
            .map_err(|e| Error::io("posting list", e))?;
        (0..self.count)
            .map(|_| -> std::io::Result<DocIdPosting> {
                let docid = self.source.read_u64::<BigEndian>()?;
                let rank = self.source.read_u32::<BigEndian>()?;
                Ok(DocIdPosting::new(docid, rank))
            })
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::io("posting list", e))
    }
}
