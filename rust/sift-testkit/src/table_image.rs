//! Writer for bucket-chain hash table images.
//!
//! The produced layout is the one `HashTableReader` consumes: a header, the bucket
//! record array, then for every bucket its position chain immediately followed by the
//! payloads of the elements it points to.

use byteorder::{BigEndian, ByteOrder};
use sift_hashtable::{BucketListHeader, BucketRecord, ELEMENT_POSITION_SIZE, HashKey};

enum ChainEntry {
    /// A position stored verbatim, not backed by a payload.
    Raw(u32),
    /// An element payload written after the chain; its offset becomes the position.
    Element(Vec<u8>),
}

/// Builder of a bucket-chain hash table image.
pub struct HashTableImage {
    buckets: Vec<Vec<ChainEntry>>,
    empty_bucket_position: Option<u32>,
}

/// Where a table landed in the output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Offset of the table header.
    pub offset: u64,
    /// Exclusive end offset of everything written for the table.
    pub end: u64,
    /// Bucket records as written.
    pub records: Vec<BucketRecord>,
    /// Chain contents per bucket, in chain order.
    pub chains: Vec<Vec<u32>>,
}

impl HashTableImage {
    /// Creates an image with `num_buckets` empty buckets. `num_buckets` may be zero to
    /// produce a malformed table.
    pub fn new(num_buckets: u32) -> HashTableImage {
        HashTableImage {
            buckets: (0..num_buckets).map(|_| Vec::new()).collect(),
            empty_bucket_position: None,
        }
    }

    /// Stores `position` for empty buckets instead of the offset where their chain
    /// would start.
    pub fn empty_bucket_position(mut self, position: u32) -> Self {
        self.empty_bucket_position = Some(position);
        self
    }

    /// Appends an element payload to the chain of `key`'s bucket.
    pub fn insert(&mut self, key: HashKey, element: impl Into<Vec<u8>>) -> &mut Self {
        let bucket = self.bucket_of(key);
        self.buckets[bucket].push(ChainEntry::Element(element.into()));
        self
    }

    /// Appends a raw position (pointing at nothing in particular) to the chain of
    /// `key`'s bucket.
    pub fn insert_position(&mut self, key: HashKey, position: u32) -> &mut Self {
        let bucket = self.bucket_of(key);
        self.buckets[bucket].push(ChainEntry::Raw(position));
        self
    }

    /// Appends the table to `out`, starting at `out.len()`.
    ///
    /// # Panics
    ///
    /// If the image does not fit in 32-bit file offsets.
    pub fn write_to(&self, out: &mut Vec<u8>) -> TableLayout {
        let offset = out.len() as u64;
        out.extend_from_slice(
            &BucketListHeader {
                num_buckets: self.buckets.len() as u32,
            }
            .encode(),
        );
        let records_start = out.len();
        out.resize(
            records_start + self.buckets.len() * BucketRecord::SIZE as usize,
            0,
        );

        let mut records = Vec::with_capacity(self.buckets.len());
        let mut chains = Vec::with_capacity(self.buckets.len());
        for (index, bucket) in self.buckets.iter().enumerate() {
            let chain_start = out.len();
            out.resize(chain_start + bucket.len() * ELEMENT_POSITION_SIZE as usize, 0);

            let mut chain = Vec::with_capacity(bucket.len());
            for entry in bucket {
                let position = match entry {
                    ChainEntry::Raw(position) => *position,
                    ChainEntry::Element(payload) => {
                        let position = to_offset(out.len());
                        out.extend_from_slice(payload);
                        position
                    }
                };
                chain.push(position);
            }
            BigEndian::write_u32_into(
                &chain,
                &mut out[chain_start..chain_start + chain.len() * ELEMENT_POSITION_SIZE as usize],
            );

            let bucket_position = match self.empty_bucket_position {
                Some(position) if bucket.is_empty() => position,
                _ => to_offset(chain_start),
            };
            let record = BucketRecord {
                chain_len: chain.len() as u32,
                bucket_position,
            };
            let at = records_start + index * BucketRecord::SIZE as usize;
            out[at..at + BucketRecord::SIZE as usize].copy_from_slice(&record.encode());
            records.push(record);
            chains.push(chain);
        }

        TableLayout {
            offset,
            end: out.len() as u64,
            records,
            chains,
        }
    }

    /// Writes the table into a fresh buffer (table offset 0).
    pub fn to_bytes(&self) -> (Vec<u8>, TableLayout) {
        let mut out = Vec::new();
        let layout = self.write_to(&mut out);
        (out, layout)
    }

    fn bucket_of(&self, key: HashKey) -> usize {
        assert!(!self.buckets.is_empty(), "cannot insert into a zero-bucket table");
        (key % self.buckets.len() as u64) as usize
    }
}

fn to_offset(pos: usize) -> u32 {
    u32::try_from(pos).expect("table image exceeds 32-bit offsets")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_layout() {
        let mut image = HashTableImage::new(2);
        image.insert(1, b"xy".to_vec()).insert_position(3, 77);
        let mut out = vec![0u8; 10];
        let layout = image.write_to(&mut out);

        assert_eq!(layout.offset, 10);
        // header 4 + records 16 => bucket 0 chain (empty) at 30, bucket 1 chain at 30
        assert_eq!(
            layout.records[0],
            BucketRecord {
                chain_len: 0,
                bucket_position: 30
            }
        );
        assert_eq!(
            layout.records[1],
            BucketRecord {
                chain_len: 2,
                bucket_position: 30
            }
        );
        // chain of two positions occupies 30..38, payload "xy" at 38
        assert_eq!(layout.chains[1], vec![38, 77]);
        assert_eq!(&out[38..40], b"xy");
        assert_eq!(layout.end, 40);
    }
}
