use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use sift_common::{Result, error::Error, verify_arg, verify_data};
use sift_io::{FileSource, IndexSource};

use crate::format::{BucketListHeader, BucketRecord, ElementPosition, HashKey};

/// Reader for a single on-disk bucket-chain hash table.
///
/// `HashTableReader` resolves a hash key to the ordered list of element positions
/// stored in the key's bucket chain. The table is addressed relative to a base
/// `offset` inside a larger index file; the header is read once at construction and
/// every lookup re-reads bucket records and chains from the source (no caching).
///
/// # Ownership
///
/// The reader owns exactly one [`IndexSource`] and repositions its cursor on every
/// lookup, so a reader must not be shared between concurrent lookups. Use
/// [`try_clone`](HashTableReader::try_clone) to obtain an independent reader (with a
/// duplicated handle) per concurrent user.
///
/// # Usage
///
/// ```rust,ignore
/// let source = FileSource::open("shard.idx")?;
/// let mut table = HashTableReader::open(source, table_offset)?;
/// for position in table.lookup_positions(key)? {
///     // decode the element stored at `position`
/// }
/// ```
pub struct HashTableReader<S = FileSource> {
    /// The index file, positioned arbitrarily between lookups.
    source: S,
    /// Base offset of the table (the location of its header).
    offset: u64,
    /// Header read at construction, converted to host order.
    header: BucketListHeader,
    /// Size of the source, used to reject records and chains that point past EOF.
    source_size: u64,
}

impl<S: IndexSource> HashTableReader<S> {
    /// Opens the table whose header starts at `offset` in `source`.
    ///
    /// # Errors
    ///
    /// - `Io` if the source cannot be sized, positioned or read.
    /// - `CorruptIndex` if the header is truncated, declares zero buckets, or the
    ///   bucket record array extends past the end of the source.
    pub fn open(mut source: S, offset: u64) -> Result<Self> {
        let source_size = source
            .size()
            .map_err(|e| Error::io("hash table source size", e))?;
        source
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io("bucket list header", e))?;
        let mut buf = [0u8; BucketListHeader::SIZE as usize];
        source
            .read_exact(&mut buf)
            .map_err(|e| Error::io("bucket list header", e))?;
        let header = BucketListHeader::decode(&buf);
        verify_data!(num_buckets, header.num_buckets > 0);

        let records_end = offset
            + BucketListHeader::SIZE
            + header.num_buckets as u64 * BucketRecord::SIZE;
        if records_end > source_size {
            return Err(Error::corrupt_index(
                "bucket records",
                format!(
                    "{} buckets at offset {offset} extend to {records_end}, past end of file ({source_size})",
                    header.num_buckets
                ),
            ));
        }

        log::debug!(
            "HashTableReader::open offset={offset} num_buckets={}",
            header.num_buckets
        );
        Ok(HashTableReader {
            source,
            offset,
            header,
            source_size,
        })
    }

    /// Creates an independent reader over the same table.
    ///
    /// The underlying handle is duplicated, so the copy and `self` never share cursor
    /// state. Assigning the result over an existing reader drops that reader's previous
    /// handle exactly once.
    pub fn try_clone(&self) -> Result<Self> {
        let source = self
            .source
            .duplicate()
            .map_err(|e| Error::io("duplicate hash table source", e))?;
        Ok(HashTableReader {
            source,
            offset: self.offset,
            header: self.header,
            source_size: self.source_size,
        })
    }

    pub fn num_buckets(&self) -> u32 {
        self.header.num_buckets
    }

    /// Base offset of the table within its source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Maps a hash key to its bucket: `key % num_buckets`.
    pub fn bucket_index(&self, key: HashKey) -> u32 {
        (key % self.header.num_buckets as u64) as u32
    }

    /// Mutable access to the underlying source, for decoding the elements that chain
    /// positions point to. Callers must not rely on the cursor position across calls.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Reads the record of bucket `bucket_index`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `bucket_index >= num_buckets`, `Io`/`CorruptIndex` on read
    /// failure.
    pub fn bucket_record(&mut self, bucket_index: u32) -> Result<BucketRecord> {
        verify_arg!(bucket_index, bucket_index < self.header.num_buckets);
        let record_offset = self.record_offset(bucket_index);
        self.source
            .seek(SeekFrom::Start(record_offset))
            .map_err(|e| Error::io("bucket record", e))?;
        let mut buf = [0u8; BucketRecord::SIZE as usize];
        self.source
            .read_exact(&mut buf)
            .map_err(|e| Error::io("bucket record", e))?;
        Ok(BucketRecord::decode(&buf))
    }

    /// Returns the element positions stored in the bucket chain of `key`, in on-file
    /// order.
    ///
    /// The chain is returned verbatim: positions are neither reordered nor
    /// deduplicated. An empty bucket yields an empty vector without touching its
    /// `bucket_position`.
    ///
    /// # Errors
    ///
    /// - `CorruptIndex` if the chain extends past the end of the source.
    /// - `Io` on seek/read failure.
    pub fn lookup_positions(&mut self, key: HashKey) -> Result<Vec<ElementPosition>> {
        let bucket_index = self.bucket_index(key);
        let record = self.bucket_record(bucket_index)?;
        log::trace!(
            "HashTableReader::lookup_positions key={key} bucket={bucket_index} chain_len={}",
            record.chain_len
        );

        if record.chain_len == 0 {
            return Ok(Vec::new());
        }
        self.verify_chain(bucket_index, &record)?;

        self.source
            .seek(SeekFrom::Start(record.bucket_position as u64))
            .map_err(|e| Error::io("element positions", e))?;
        let mut positions = vec![0 as ElementPosition; record.chain_len as usize];
        self.source
            .read_u32_into::<BigEndian>(&mut positions)
            .map_err(|e| Error::io("element positions", e))?;
        Ok(positions)
    }

    /// Checks that every non-empty bucket chain lies entirely within the source.
    ///
    /// Reads the whole bucket record array (but no chains).
    pub fn validate(&mut self) -> Result<()> {
        let num_buckets = self.header.num_buckets;
        self.source
            .seek(SeekFrom::Start(self.record_offset(0)))
            .map_err(|e| Error::io("bucket records", e))?;
        let mut buf = vec![0u8; num_buckets as usize * BucketRecord::SIZE as usize];
        self.source
            .read_exact(&mut buf)
            .map_err(|e| Error::io("bucket records", e))?;

        for (bucket_index, chunk) in buf.chunks_exact(BucketRecord::SIZE as usize).enumerate() {
            let mut raw = [0u8; BucketRecord::SIZE as usize];
            raw.copy_from_slice(chunk);
            let record = BucketRecord::decode(&raw);
            if record.chain_len > 0 {
                self.verify_chain(bucket_index as u32, &record)?;
            }
        }
        Ok(())
    }

    fn record_offset(&self, bucket_index: u32) -> u64 {
        self.offset + BucketListHeader::SIZE + bucket_index as u64 * BucketRecord::SIZE
    }

    fn verify_chain(&self, bucket_index: u32, record: &BucketRecord) -> Result<()> {
        if record.chain_end() > self.source_size {
            return Err(Error::corrupt_index(
                "bucket chain",
                format!(
                    "bucket {bucket_index}: {} positions at {} extend past end of file ({})",
                    record.chain_len, record.bucket_position, self.source_size
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sift_io::MemorySource;

    use super::*;

    /// Builds a table at `base` with the given (chain_len, bucket_position) records,
    /// followed by `tail` raw bytes.
    fn image(base: usize, records: &[(u32, u32)], tail: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xAAu8; base];
        bytes.extend_from_slice(
            &BucketListHeader {
                num_buckets: records.len() as u32,
            }
            .encode(),
        );
        for &(chain_len, bucket_position) in records {
            bytes.extend_from_slice(
                &BucketRecord {
                    chain_len,
                    bucket_position,
                }
                .encode(),
            );
        }
        bytes.extend_from_slice(tail);
        bytes
    }

    #[test]
    fn test_open_rejects_zero_buckets() {
        let bytes = image(0, &[], &[]);
        let err = HashTableReader::open(MemorySource::new(bytes), 0).err().unwrap();
        assert!(err.is_corrupt_index());
    }

    #[test]
    fn test_open_rejects_truncated_header() {
        let err = HashTableReader::open(MemorySource::new(vec![0u8, 0]), 0)
            .err()
            .unwrap();
        assert!(err.is_corrupt_index());
    }

    #[test]
    fn test_open_rejects_records_past_eof() {
        let mut bytes = image(0, &[(0, 0), (0, 0)], &[]);
        bytes.truncate(bytes.len() - 1);
        let err = HashTableReader::open(MemorySource::new(bytes), 0).err().unwrap();
        assert!(err.is_corrupt_index());
    }

    #[test]
    fn test_lookup_at_nonzero_base() {
        // header at 16, two records, chain at 16 + 4 + 16 = 36
        let bytes = image(16, &[(0, 0), (1, 36)], &[0, 0, 0, 99]);
        let mut reader = HashTableReader::open(MemorySource::new(bytes), 16).unwrap();
        assert_eq!(reader.num_buckets(), 2);
        assert_eq!(reader.offset(), 16);
        assert_eq!(reader.lookup_positions(1).unwrap(), vec![99]);
        assert_eq!(reader.lookup_positions(3).unwrap(), vec![99]);
        assert!(reader.lookup_positions(2).unwrap().is_empty());
    }

    #[test]
    fn test_chain_past_eof_is_corrupt() {
        let bytes = image(0, &[(3, 12)], &[0, 0, 0, 1]);
        let mut reader = HashTableReader::open(MemorySource::new(bytes), 0).unwrap();
        let err = reader.lookup_positions(0).unwrap_err();
        assert!(err.is_corrupt_index());
        assert!(reader.validate().unwrap_err().is_corrupt_index());
    }

    #[test]
    fn test_bucket_record_out_of_range() {
        let bytes = image(0, &[(0, 0)], &[]);
        let mut reader = HashTableReader::open(MemorySource::new(bytes), 0).unwrap();
        assert_eq!(reader.bucket_record(0).unwrap(), BucketRecord::default());
        let err = reader.bucket_record(1).unwrap_err();
        assert!(matches!(
            err.kind(),
            sift_common::error::ErrorKind::InvalidArgument { .. }
        ));
    }
}
