use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
    sync::Arc,
};

use sift_common::{Result, error::Error, verify_arg};

use crate::{
    posting::{DocIdPosting, IntersectionStrategy, Rank, intersect},
    provider::{ShardOpener, ShardReaders, WordLookup},
};

/// A single ranked match returned by [`QueryProcessor::process_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub document_name: String,
    /// Sum over all query terms of the term's occurrence count in the document.
    pub rank: Rank,
}

impl QueryResult {
    /// Result ordering: higher rank first.
    pub fn cmp_by_rank(&self, other: &QueryResult) -> Ordering {
        other.rank.cmp(&self.rank)
    }
}

/// Orders `results` by rank, highest first.
///
/// The sort is stable: results with equal rank keep the order in which they were
/// produced (shard order, then emission order within a shard).
pub fn sort_results(results: &mut [QueryResult]) {
    results.sort_by(QueryResult::cmp_by_rank);
}

/// Options for opening a [`QueryProcessor`].
pub struct QueryProcessorOptions {
    opener: Arc<dyn ShardOpener>,
    validate: bool,
    intersection: IntersectionStrategy,
}

impl QueryProcessorOptions {
    /// Creates new options that open shards through `opener`.
    ///
    /// Defaults: no validation, [`IntersectionStrategy::Scan`].
    pub fn new(opener: Arc<dyn ShardOpener>) -> Self {
        Self {
            opener,
            validate: false,
            intersection: IntersectionStrategy::default(),
        }
    }

    /// Whether each shard's internal structure is checked when it is opened.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Sets the posting-list intersection algorithm.
    pub fn intersection(mut self, strategy: IntersectionStrategy) -> Self {
        self.intersection = strategy;
        self
    }

    /// Opens every shard in `shard_paths`, in order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `shard_paths` is empty.
    /// - `ShardOpen` (wrapping the opener's error) for the first shard that fails to
    ///   open or validate. Shards opened before the failure are released.
    pub fn open<I, P>(self, shard_paths: I) -> Result<QueryProcessor>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let shard_paths = shard_paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect::<Vec<_>>();
        verify_arg!(shard_paths, !shard_paths.is_empty());

        let mut shards = Vec::with_capacity(shard_paths.len());
        for path in shard_paths {
            let readers = self
                .opener
                .open(&path, self.validate)
                .map_err(|e| Error::shard_open(&path, e))?;
            log::debug!(
                "QueryProcessor: opened shard {} ({}) validate={}",
                shards.len(),
                path.display(),
                self.validate
            );
            shards.push(Shard { path, readers });
        }

        Ok(QueryProcessor {
            shards,
            intersection: self.intersection,
        })
    }
}

/// One opened shard and its lookup providers.
struct Shard {
    path: PathBuf,
    readers: ShardReaders,
}

/// Evaluates multi-term AND queries across a fixed, ordered list of shards.
///
/// The processor owns one [`ShardReaders`] pair per shard for its entire lifetime.
/// Evaluation moves the providers' file cursors, so `process_query` takes `&mut self`;
/// run concurrent queries on separate processors obtained with
/// [`try_clone`](QueryProcessor::try_clone).
pub struct QueryProcessor {
    shards: Vec<Shard>,
    intersection: IntersectionStrategy,
}

impl QueryProcessor {
    /// Opens `shard_paths` through `opener` with the default intersection strategy.
    ///
    /// Shorthand for `QueryProcessorOptions::new(opener).validate(validate).open(..)`.
    pub fn open<I, P>(opener: Arc<dyn ShardOpener>, shard_paths: I, validate: bool) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        QueryProcessorOptions::new(opener)
            .validate(validate)
            .open(shard_paths)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Paths of the shards, in evaluation order.
    pub fn shard_paths(&self) -> impl Iterator<Item = &Path> {
        self.shards.iter().map(|s| s.path.as_path())
    }

    pub fn intersection(&self) -> IntersectionStrategy {
        self.intersection
    }

    /// Creates an independent processor over the same shards.
    ///
    /// Every per-shard provider is duplicated, so the copy can evaluate queries
    /// concurrently with `self` (e.g. from another thread).
    pub fn try_clone(&self) -> Result<QueryProcessor> {
        let shards = self
            .shards
            .iter()
            .map(|shard| {
                Ok(Shard {
                    path: shard.path.clone(),
                    readers: shard.readers.duplicate()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(QueryProcessor {
            shards,
            intersection: self.intersection,
        })
    }

    /// Evaluates the AND query `terms` and returns the matches of all shards, ordered
    /// by rank (highest first, ties in shard then emission order).
    ///
    /// Within a shard, a document matches if every term occurs in it; its rank is the
    /// sum of the terms' occurrence counts. A shard missing any term contributes
    /// nothing.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `terms` is empty.
    /// - `CorruptIndex` if a matched docid cannot be resolved to a document name.
    /// - Any error reported by the shard providers.
    pub fn process_query<T: AsRef<str>>(&mut self, terms: &[T]) -> Result<Vec<QueryResult>> {
        verify_arg!(terms, !terms.is_empty());
        let strategy = self.intersection;

        let mut results = Vec::new();
        for (shard_index, shard) in self.shards.iter_mut().enumerate() {
            let matches = shard_matches(shard.readers.words.as_mut(), terms, strategy)?;
            log::debug!(
                "QueryProcessor: shard {shard_index} ({}) matched {} documents",
                shard.path.display(),
                matches.len()
            );

            for posting in matches {
                let document_name = shard
                    .readers
                    .docs
                    .lookup_docid(posting.docid)?
                    .ok_or_else(|| {
                        Error::corrupt_index(
                            format!("document table of shard '{}'", shard.path.display()),
                            format!("matched docid {} has no document", posting.docid),
                        )
                    })?;
                results.push(QueryResult {
                    document_name,
                    rank: posting.rank,
                });
            }
        }

        sort_results(&mut results);
        Ok(results)
    }
}

/// Intersects the posting lists of all `terms` within one shard.
fn shard_matches<T: AsRef<str>>(
    words: &mut dyn WordLookup,
    terms: &[T],
    strategy: IntersectionStrategy,
) -> Result<Vec<DocIdPosting>> {
    let Some((first, rest)) = terms.split_first() else {
        return Ok(Vec::new());
    };

    let mut running = match lookup_entries(words, first.as_ref())? {
        Some(entries) => entries,
        None => return Ok(Vec::new()),
    };

    for term in rest {
        if running.is_empty() {
            break;
        }
        match lookup_entries(words, term.as_ref())? {
            Some(entries) => running = intersect(&running, &entries, strategy),
            None => {
                running.clear();
                break;
            }
        }
    }
    Ok(running)
}

fn lookup_entries(words: &mut dyn WordLookup, term: &str) -> Result<Option<Vec<DocIdPosting>>> {
    let Some(mut list) = words.lookup_word(term)? else {
        log::trace!("QueryProcessor: term '{term}' not in shard");
        return Ok(None);
    };
    list.entries().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, rank: Rank) -> QueryResult {
        QueryResult {
            document_name: name.to_string(),
            rank,
        }
    }

    #[test]
    fn test_sort_results_rank_descending_and_stable() {
        let mut results = vec![
            result("a", 1),
            result("b", 5),
            result("c", 1),
            result("d", 5),
            result("e", 3),
        ];
        sort_results(&mut results);
        let names = results
            .iter()
            .map(|r| r.document_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["b", "d", "e", "a", "c"]);
    }

    #[test]
    fn test_sort_results_random_is_non_increasing() {
        fastrand::seed(42);
        let mut results = (0..500)
            .map(|i| result(&format!("doc{i}"), fastrand::u32(0..10)))
            .collect::<Vec<_>>();
        let original = results.clone();
        sort_results(&mut results);

        for pair in results.windows(2) {
            assert!(pair[0].rank >= pair[1].rank);
            if pair[0].rank == pair[1].rank {
                let pos = |r: &QueryResult| original.iter().position(|o| o == r).unwrap();
                assert!(pos(&pair[0]) < pos(&pair[1]));
            }
        }
    }
}
