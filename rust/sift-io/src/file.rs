use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
    sync::OnceLock,
};

use crate::{IndexSource, utils::resolve_seek};

/// File-backed [`IndexSource`].
///
/// Reads are positional (`pread` on unix, `seek_read` on windows) from a cursor kept
/// in the `FileSource` itself, so the OS-level file offset is never consulted.
/// Duplicated descriptors share that OS offset, while the logical cursors of two
/// `FileSource` handles stay independent.
pub struct FileSource {
    file: File,
    pos: u64,
    size: OnceLock<u64>,
}

impl FileSource {
    pub fn new(file: File) -> FileSource {
        FileSource {
            file,
            pos: 0,
            size: Default::default(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileSource> {
        Ok(FileSource::new(File::open(path)?))
    }

    /// Returns the current cursor position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn get_size(&self) -> std::io::Result<u64> {
        if let Some(&size) = self.size.get() {
            Ok(size)
        } else {
            let size = self.file.metadata()?.len();
            let _ = self.size.set(size);
            Ok(size)
        }
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = file_read_at(&self.file, self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for FileSource {
    fn seek(&mut self, target: SeekFrom) -> std::io::Result<u64> {
        let size = match target {
            SeekFrom::End(_) => self.get_size()?,
            _ => 0,
        };
        self.pos = resolve_seek(self.pos, size, target)?;
        Ok(self.pos)
    }
}

impl IndexSource for FileSource {
    fn size(&self) -> std::io::Result<u64> {
        self.get_size()
    }

    fn duplicate(&self) -> std::io::Result<FileSource> {
        let size = OnceLock::new();
        if let Some(&known) = self.size.get() {
            let _ = size.set(known);
        }
        Ok(FileSource {
            file: self.file.try_clone()?,
            pos: self.pos,
            size,
        })
    }
}

#[cfg(unix)]
pub fn file_read_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;

    loop {
        match file.read_at(buf, pos) {
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            res => return res,
        }
    }
}

#[cfg(windows)]
pub fn file_read_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;

    match file.seek_read(buf, pos) {
        // Reading at or beyond EOF reports `HandleEof` instead of a zero-length read.
        Err(e) if e.raw_os_error() == Some(38) => Ok(0),
        res => res,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use crate::{IndexSource, file::FileSource};

    fn make_file(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("test.idx");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(content).expect("write_all");
        file.sync_all().expect("sync");
        (tempdir, path)
    }

    #[test]
    fn test_file_source_seek_and_read() {
        let (_dir, path) = make_file(b"abcdefgh12345678");
        let mut source = FileSource::open(&path).expect("open file");
        assert_eq!(source.size().unwrap(), 16);

        source.seek(SeekFrom::Start(8)).unwrap();
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"1234");
        assert_eq!(source.position(), 12);

        source.seek(SeekFrom::End(-2)).unwrap();
        source.read_exact(&mut buf[..2]).unwrap();
        assert_eq!(&buf[..2], b"78");
    }

    #[test]
    fn test_file_source_read_past_end() {
        let (_dir, path) = make_file(b"abcd");
        let mut source = FileSource::open(&path).expect("open file");
        source.seek(SeekFrom::Start(2)).unwrap();
        let mut buf = [0u8; 4];
        let err = source.read_exact(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

        source.seek(SeekFrom::Start(100)).unwrap();
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_has_independent_cursor() {
        let (_dir, path) = make_file(b"0123456789");
        let mut original = FileSource::open(&path).expect("open file");
        original.seek(SeekFrom::Start(3)).unwrap();

        let mut copy = original.duplicate().expect("duplicate");
        assert_eq!(copy.position(), 3);

        let mut buf = [0u8; 2];
        copy.seek(SeekFrom::Start(7)).unwrap();
        copy.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"78");

        original.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"34");

        drop(original);
        copy.seek(SeekFrom::Start(0)).unwrap();
        copy.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"01");
    }
}
