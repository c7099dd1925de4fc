//! Posting entries and posting-list intersection.

use ahash::AHashMap;

/// Document identifier within one shard.
pub type DocId = u64;

/// Occurrence-weighted relevance of a document.
pub type Rank = u32;

/// A (document, occurrence count) pair from one term's posting list in one shard.
///
/// After intersection, `rank` holds the sum of the occurrence counts of every term
/// intersected so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocIdPosting {
    pub docid: DocId,
    pub rank: Rank,
}

impl DocIdPosting {
    pub fn new(docid: DocId, rank: Rank) -> DocIdPosting {
        DocIdPosting { docid, rank }
    }
}

/// Algorithm used to intersect two posting lists.
///
/// Both strategies produce identical output; they differ only in cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionStrategy {
    /// All-pairs scan, `O(len1 * len2)`. Cheapest for short per-shard lists.
    #[default]
    Scan,
    /// Builds a docid map over the second list, `O(len1 + len2)`.
    Hashed,
}

/// Intersects `list1` with `list2` by docid using the given strategy.
///
/// For every entry of `list1`, in order, the first entry of `list2` with the same
/// docid is looked up; on a match one entry is emitted with the summed rank, otherwise
/// the `list1` entry is dropped. Neither list needs to be sorted.
pub fn intersect(
    list1: &[DocIdPosting],
    list2: &[DocIdPosting],
    strategy: IntersectionStrategy,
) -> Vec<DocIdPosting> {
    match strategy {
        IntersectionStrategy::Scan => intersect_scan(list1, list2),
        IntersectionStrategy::Hashed => intersect_hashed(list1, list2),
    }
}

/// All-pairs intersection; see [`intersect`].
pub fn intersect_scan(list1: &[DocIdPosting], list2: &[DocIdPosting]) -> Vec<DocIdPosting> {
    list1
        .iter()
        .filter_map(|p1| {
            list2
                .iter()
                .find(|p2| p2.docid == p1.docid)
                .map(|p2| DocIdPosting::new(p1.docid, p1.rank.saturating_add(p2.rank)))
        })
        .collect()
}

/// Map-based intersection; see [`intersect`].
pub fn intersect_hashed(list1: &[DocIdPosting], list2: &[DocIdPosting]) -> Vec<DocIdPosting> {
    if list1.is_empty() || list2.is_empty() {
        return Vec::new();
    }
    let mut first_rank = AHashMap::with_capacity(list2.len());
    for p2 in list2 {
        // first match wins, mirroring the scan
        first_rank.entry(p2.docid).or_insert(p2.rank);
    }
    list1
        .iter()
        .filter_map(|p1| {
            first_rank
                .get(&p1.docid)
                .map(|&rank| DocIdPosting::new(p1.docid, p1.rank.saturating_add(rank)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postings(pairs: &[(DocId, Rank)]) -> Vec<DocIdPosting> {
        pairs
            .iter()
            .map(|&(docid, rank)| DocIdPosting::new(docid, rank))
            .collect()
    }

    const STRATEGIES: [IntersectionStrategy; 2] =
        [IntersectionStrategy::Scan, IntersectionStrategy::Hashed];

    #[test]
    fn test_intersect_sums_ranks() {
        let cat = postings(&[(5, 3)]);
        let dog = postings(&[(5, 2), (9, 1)]);
        for strategy in STRATEGIES {
            assert_eq!(intersect(&cat, &dog, strategy), postings(&[(5, 5)]));
        }
    }

    #[test]
    fn test_intersect_with_empty() {
        let a = postings(&[(1, 1), (2, 2)]);
        for strategy in STRATEGIES {
            assert!(intersect(&a, &[], strategy).is_empty());
            assert!(intersect(&[], &a, strategy).is_empty());
        }
    }

    #[test]
    fn test_self_intersection_doubles_ranks() {
        let a = postings(&[(7, 1), (3, 4), (11, 2)]);
        for strategy in STRATEGIES {
            assert_eq!(
                intersect(&a, &a, strategy),
                postings(&[(7, 2), (3, 8), (11, 4)])
            );
        }
    }

    #[test]
    fn test_intersect_keeps_list1_order() {
        let a = postings(&[(9, 1), (2, 1), (5, 1)]);
        let b = postings(&[(5, 10), (9, 20), (2, 30)]);
        for strategy in STRATEGIES {
            assert_eq!(
                intersect(&a, &b, strategy),
                postings(&[(9, 21), (2, 31), (5, 11)])
            );
        }
    }

    #[test]
    fn test_first_match_in_list2_wins() {
        let a = postings(&[(4, 1), (4, 2)]);
        let b = postings(&[(4, 10), (4, 100)]);
        for strategy in STRATEGIES {
            assert_eq!(intersect(&a, &b, strategy), postings(&[(4, 11), (4, 12)]));
        }
    }

    #[test]
    fn test_rank_saturates() {
        let a = postings(&[(1, Rank::MAX)]);
        let b = postings(&[(1, 5)]);
        for strategy in STRATEGIES {
            assert_eq!(intersect(&a, &b, strategy), postings(&[(1, Rank::MAX)]));
        }
    }

    #[test]
    fn test_strategies_agree_on_random_lists() {
        fastrand::seed(0x51f7);
        for _ in 0..200 {
            let a: Vec<_> = (0..fastrand::usize(0..40))
                .map(|_| DocIdPosting::new(fastrand::u64(0..50), fastrand::u32(1..20)))
                .collect();
            let b: Vec<_> = (0..fastrand::usize(0..40))
                .map(|_| DocIdPosting::new(fastrand::u64(0..50), fastrand::u32(1..20)))
                .collect();
            assert_eq!(intersect_scan(&a, &b), intersect_hashed(&a, &b));
        }
    }
}
