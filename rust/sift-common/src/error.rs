use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the error signals an inconsistent or truncated index file.
    pub fn is_corrupt_index(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptIndex { .. })
    }

    #[cold]
    pub fn corrupt_index(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptIndex {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    #[cold]
    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Wraps an I/O failure that happened while reading `context`.
    ///
    /// A premature end-of-file while reading a fixed-size structure means the
    /// file is shorter than its own headers claim, so it is reported as
    /// [`ErrorKind::CorruptIndex`] rather than as a plain I/O error.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        let context = context.into();
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            return Error::corrupt_index(context, "unexpected end of file");
        }
        Error(ErrorKind::Io { context, source }.into())
    }

    pub fn shard_open(path: impl Into<PathBuf>, source: Error) -> Error {
        Error(
            ErrorKind::ShardOpen {
                path: path.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("corrupt index for '{element}': {message}")]
    CorruptIndex { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("failed to open shard '{}': {source}", path.display())]
    ShardOpen { path: PathBuf, source: Error },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("index source", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_is_corrupt_index() {
        let e = Error::io(
            "bucket record",
            std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
        );
        assert!(e.is_corrupt_index());
        assert!(e.to_string().contains("bucket record"));
    }

    #[test]
    fn test_other_io_errors_are_preserved() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert!(matches!(e.kind(), ErrorKind::Io { .. }));
        assert!(!e.is_corrupt_index());
        assert!(e.to_string().starts_with("IO error for 'index source': "));
    }

    #[test]
    fn test_shard_open_display() {
        let inner = Error::corrupt_index("header", "bad magic");
        let e = Error::shard_open("/tmp/a.idx", inner);
        let msg = e.to_string();
        assert!(msg.contains("/tmp/a.idx"));
        assert!(msg.contains("bad magic"));
    }
}
