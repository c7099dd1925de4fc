//! Multi-term AND query evaluation over a set of independently built index shards.
//!
//! A [`QueryProcessor`] owns one pair of per-shard lookup providers
//! ([`DocLookup`], [`WordLookup`]) for every shard it was opened with. A query is
//! evaluated against each shard on its own: the posting lists of all terms are
//! intersected (ranks summed per document), surviving docids are resolved to
//! document names, and the matches of all shards are merged into one list ordered by
//! rank, highest first.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sift_query::QueryProcessorOptions;
//!
//! let mut processor = QueryProcessorOptions::new(opener)
//!     .validate(true)
//!     .open(["shard-0.idx", "shard-1.idx"])?;
//!
//! for result in processor.process_query(&["cat", "dog"])? {
//!     println!("{} ({})", result.document_name, result.rank);
//! }
//! ```

mod posting;
mod processor;
mod provider;

pub use posting::{
    DocId, DocIdPosting, IntersectionStrategy, Rank, intersect, intersect_hashed, intersect_scan,
};
pub use processor::{QueryProcessor, QueryProcessorOptions, QueryResult, sort_results};
pub use provider::{DocLookup, PostingList, ShardOpener, ShardReaders, WordLookup};
