//! I/O abstractions for index readers:
//! - `IndexSource`: a seekable, readable handle over immutable index bytes that can be
//!   duplicated into an independent handle with its own cursor.
//!
//! Provides a couple of simple implementations: file-based and memory-based.

use std::io::{Read, Seek};

pub mod file;
pub mod memory;
pub mod utils;

pub use file::FileSource;
pub use memory::MemorySource;

/// A trait representing an open, read-only index file (or an in-memory image of one)
/// with a private cursor.
///
/// Every reader built on top of an `IndexSource` repositions the cursor before each
/// read, so the cursor is mutable state owned by exactly one handle. Sharing a handle
/// between concurrent users requires either external synchronization or a
/// [`duplicate`](IndexSource::duplicate) per user.
pub trait IndexSource: Read + Seek + Send {
    /// Returns the total size of the underlying bytes.
    fn size(&self) -> std::io::Result<u64>;

    /// Creates an independent handle over the same underlying bytes.
    ///
    /// The returned handle starts at the same cursor position as `self`, but
    /// subsequent seeks and reads on either handle never affect the other.
    /// File-backed implementations acquire a new OS handle; dropping either copy
    /// releases only its own handle.
    fn duplicate(&self) -> std::io::Result<Self>
    where
        Self: Sized;
}
