//! On-disk records of a bucket-chain hash table.
//!
//! All multi-byte fields are stored big-endian. A table starting at `offset` looks like:
//!
//! ```text
//! offset + 0                 BucketListHeader  { num_buckets: u32 }
//! offset + 4 + i * 8         BucketRecord[i]   { chain_len: u32, bucket_position: u32 }
//! bucket_position            chain_len x u32   element positions (absolute file offsets)
//! ```

use byteorder::{BigEndian, ByteOrder};

/// Key used to select a bucket (`key % num_buckets`).
pub type HashKey = u64;

/// Absolute file offset of a stored element, as recorded in a bucket chain.
pub type ElementPosition = u32;

/// Width of one element position in a chain.
pub const ELEMENT_POSITION_SIZE: u64 = 4;

const HEADER_LEN: usize = 4;
const RECORD_LEN: usize = 8;

/// Table header, located at the table's base offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketListHeader {
    pub num_buckets: u32,
}

impl BucketListHeader {
    pub const SIZE: u64 = HEADER_LEN as u64;

    pub fn decode(buf: &[u8; HEADER_LEN]) -> BucketListHeader {
        BucketListHeader {
            num_buckets: BigEndian::read_u32(buf),
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        BigEndian::write_u32(&mut buf, self.num_buckets);
        buf
    }
}

/// Per-bucket record: how many positions the chain holds and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketRecord {
    pub chain_len: u32,
    pub bucket_position: u32,
}

impl BucketRecord {
    pub const SIZE: u64 = RECORD_LEN as u64;

    pub fn decode(buf: &[u8; RECORD_LEN]) -> BucketRecord {
        BucketRecord {
            chain_len: BigEndian::read_u32(&buf[0..4]),
            bucket_position: BigEndian::read_u32(&buf[4..8]),
        }
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        BigEndian::write_u32(&mut buf[0..4], self.chain_len);
        BigEndian::write_u32(&mut buf[4..8], self.bucket_position);
        buf
    }

    /// Byte length of this record's position chain.
    pub fn chain_size(&self) -> u64 {
        self.chain_len as u64 * ELEMENT_POSITION_SIZE
    }

    /// Exclusive end offset of this record's position chain.
    pub fn chain_end(&self) -> u64 {
        self.bucket_position as u64 + self.chain_size()
    }
}
