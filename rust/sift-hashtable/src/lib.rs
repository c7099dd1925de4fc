mod format;
mod read;

pub use format::{BucketListHeader, BucketRecord, ELEMENT_POSITION_SIZE, ElementPosition, HashKey};
pub use read::hashtable_reader::HashTableReader;
