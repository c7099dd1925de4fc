use std::{
    io::{Read, Seek, SeekFrom},
    sync::Arc,
};

use crate::{IndexSource, utils::resolve_seek};

/// Memory-backed [`IndexSource`] over an immutable, shared byte image.
///
/// Duplicates share the bytes and carry their own cursor.
#[derive(Debug)]
pub struct MemorySource {
    data: Arc<[u8]>,
    pos: u64,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> MemorySource {
        MemorySource {
            data: data.into(),
            pos: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = self.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = std::cmp::min(buf.len(), self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for MemorySource {
    fn seek(&mut self, target: SeekFrom) -> std::io::Result<u64> {
        self.pos = resolve_seek(self.pos, self.data.len() as u64, target)?;
        Ok(self.pos)
    }
}

impl IndexSource for MemorySource {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn duplicate(&self) -> std::io::Result<MemorySource> {
        Ok(MemorySource {
            data: Arc::clone(&self.data),
            pos: self.pos,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom};

    use crate::{IndexSource, MemorySource};

    #[test]
    fn test_mem_source() {
        let mut source = MemorySource::new(b"abcd123".to_vec());
        assert_eq!(source.size().unwrap(), 7);

        source.seek(SeekFrom::Start(1)).unwrap();
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"bc");

        source.seek(SeekFrom::Start(4)).unwrap();
        let mut rest = Vec::new();
        source.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"123");
    }

    #[test]
    fn test_mem_source_duplicate() {
        let mut source = MemorySource::new(b"abcd123".to_vec());
        source.seek(SeekFrom::Start(2)).unwrap();
        let mut copy = source.duplicate().unwrap();
        copy.seek(SeekFrom::Start(5)).unwrap();
        assert_eq!(source.position(), 2);
        assert_eq!(copy.position(), 5);
        assert_eq!(copy.as_bytes(), source.as_bytes());
    }
}
