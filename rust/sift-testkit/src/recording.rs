//! An [`IndexSource`] wrapper that records every read it serves.

use std::{
    io::{Read, Seek, SeekFrom},
    sync::{Arc, Mutex},
};

use sift_io::IndexSource;

/// A single read served by a [`RecordingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadEvent {
    /// Cursor position at the start of the read.
    pub position: u64,
    /// Number of bytes returned.
    pub len: usize,
}

/// Shared log of the reads performed through a [`RecordingSource`] and its
/// duplicates.
#[derive(Debug, Clone, Default)]
pub struct ReadLog(Arc<Mutex<Vec<ReadEvent>>>);

impl ReadLog {
    pub fn events(&self) -> Vec<ReadEvent> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.0.lock() {
            events.clear();
        }
    }

    /// Returns `true` if any recorded read covered byte `position`.
    pub fn touched(&self, position: u64) -> bool {
        self.events()
            .iter()
            .any(|e| e.position <= position && position < e.position + e.len as u64)
    }

    fn push(&self, event: ReadEvent) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }
}

/// Wraps an [`IndexSource`] and appends a [`ReadEvent`] to a [`ReadLog`] for every
/// non-empty read.
pub struct RecordingSource<S> {
    inner: S,
    pos: u64,
    log: ReadLog,
}

impl<S: IndexSource> RecordingSource<S> {
    pub fn new(inner: S) -> (RecordingSource<S>, ReadLog) {
        let log = ReadLog::default();
        let source = RecordingSource {
            inner,
            pos: 0,
            log: log.clone(),
        };
        (source, log)
    }
}

impl<S: IndexSource> Read for RecordingSource<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.log.push(ReadEvent {
                position: self.pos,
                len: n,
            });
        }
        self.pos += n as u64;
        Ok(n)
    }
}

impl<S: IndexSource> Seek for RecordingSource<S> {
    fn seek(&mut self, target: SeekFrom) -> std::io::Result<u64> {
        self.pos = self.inner.seek(target)?;
        Ok(self.pos)
    }
}

impl<S: IndexSource> IndexSource for RecordingSource<S> {
    fn size(&self) -> std::io::Result<u64> {
        self.inner.size()
    }

    fn duplicate(&self) -> std::io::Result<Self> {
        Ok(RecordingSource {
            inner: self.inner.duplicate()?,
            pos: self.pos,
            log: self.log.clone(),
        })
    }
}
