use std::io::SeekFrom;

/// Resolves a [`SeekFrom`] request against the current cursor and the source size.
///
/// Seeking past the end is allowed (subsequent reads return EOF), seeking before
/// byte zero is an `InvalidInput` error and leaves the cursor untouched.
pub fn resolve_seek(pos: u64, size: u64, target: SeekFrom) -> std::io::Result<u64> {
    let (base, offset) = match target {
        SeekFrom::Start(offset) => return Ok(offset),
        SeekFrom::End(offset) => (size, offset),
        SeekFrom::Current(offset) => (pos, offset),
    };
    base.checked_add_signed(offset).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("seek to {base} {offset:+} is out of range"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::SeekFrom;

    use super::resolve_seek;

    #[test]
    fn test_resolve_seek() {
        assert_eq!(resolve_seek(5, 10, SeekFrom::Start(7)).unwrap(), 7);
        assert_eq!(resolve_seek(5, 10, SeekFrom::Current(3)).unwrap(), 8);
        assert_eq!(resolve_seek(5, 10, SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(resolve_seek(5, 10, SeekFrom::End(-2)).unwrap(), 8);
        assert_eq!(resolve_seek(5, 10, SeekFrom::End(4)).unwrap(), 14);
        let err = resolve_seek(5, 10, SeekFrom::Current(-6)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        let err = resolve_seek(0, 10, SeekFrom::End(-11)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("out of range"));
    }
}
