// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! File-descriptor I/O strategies: a tagged variant rather than an OO hierarchy.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use thiserror::Error;

/// `lseek`'s `whence` argument: `SEEK_CUR=0, SEEK_END=1, SEEK_SET=2`, deliberately not
/// POSIX's own numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    Cur,
    End,
    Set,
}

impl Whence {
    #[must_use]
    pub fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Whence::Cur),
            1 => Some(Whence::End),
            2 => Some(Whence::Set),
            _ => None,
        }
    }
}

/// Raised by a host-level I/O operation; caught at the trap dispatch boundary and
/// translated to the `$FFFF` AX-register error protocol
#[derive(Debug, Error)]
pub enum HostIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown file descriptor {0}")]
    UnknownFd(u16),
    #[error("unsupported operation on this descriptor")]
    Unsupported,
}

/// One entry in the fd table.
pub enum FileDescriptor {
    /// fd 0/1/2: the console. Input bytes accumulate in `pending` until drained by reads.
    Console { pending: VecDeque<u8> },
    /// A host-backed file opened via the `open` trap.
    HostFile(File),
    /// A descriptor that was `close()`d; kept as a tombstone so reuse of the number is an
    /// explicit `UnknownFd` rather than silently acting on a stale handle.
    Closed,
}

impl FileDescriptor {
    #[must_use]
    pub fn new_console() -> Self {
        FileDescriptor::Console { pending: VecDeque::new() }
    }

    pub fn read(&mut self, count: usize) -> Result<Vec<u8>, HostIoError> {
        match self {
            FileDescriptor::Console { pending } => {
                let n = count.min(pending.len());
                Ok(pending.drain(..n).collect())
            }
            FileDescriptor::HostFile(file) => {
                let mut buf = vec![0u8; count];
                let n = file.read(&mut buf)?;
                buf.truncate(n);
                Ok(buf)
            }
            FileDescriptor::Closed => Err(HostIoError::Unsupported),
        }
    }

    /// Console descriptors never reach this: fd 1/2 writes are intercepted by
    /// [`super::HostAbi::dispatch`] and routed to its output ring buffer instead, so an
    /// embedder that attaches mid-session still sees recent output
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, HostIoError> {
        match self {
            FileDescriptor::HostFile(file) => Ok(file.write(bytes)?),
            FileDescriptor::Console { .. } | FileDescriptor::Closed => Err(HostIoError::Unsupported),
        }
    }

    /// Host files track their position via `std::io::Seek`, so `lseek` is fully supported
    /// rather than the "unsupported" stub some sim65 ports leave it as.
    pub fn lseek(&mut self, offset: i64, whence: Whence) -> Result<u64, HostIoError> {
        match self {
            FileDescriptor::HostFile(file) => {
                let from = match whence {
                    Whence::Cur => SeekFrom::Current(offset),
                    Whence::End => SeekFrom::End(offset),
                    Whence::Set => SeekFrom::Start(offset as u64),
                };
                Ok(file.seek(from)?)
            }
            FileDescriptor::Console { .. } | FileDescriptor::Closed => Err(HostIoError::Unsupported),
        }
    }

    pub fn close(&mut self) {
        *self = FileDescriptor::Closed;
    }

    /// Appends bytes to a console descriptor's pending input buffer.
    pub fn feed_console_input(&mut self, bytes: &[u8]) {
        if let FileDescriptor::Console { pending } = self {
            pending.extend(bytes);
        }
    }

    #[must_use]
    pub fn console_input_empty(&self) -> bool {
        matches!(self, FileDescriptor::Console { pending } if pending.is_empty())
    }
}

/// `open`'s mode bits
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenFlags(pub u16);

impl OpenFlags {
    const RDONLY: u16 = 0x01;
    const WRONLY: u16 = 0x02;
    const CREAT: u16 = 0x10;
    const TRUNC: u16 = 0x20;
    const APPEND: u16 = 0x40;
    const EXCL: u16 = 0x80;

    #[must_use]
    pub fn to_open_options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        let access = self.0 & 0x03;
        opts.read(access == Self::RDONLY || access == 0x03);
        opts.write(access == Self::WRONLY || access == 0x03);
        if self.0 & Self::CREAT != 0 {
            opts.create(true);
        }
        if self.0 & Self::TRUNC != 0 {
            opts.truncate(true);
        }
        if self.0 & Self::APPEND != 0 {
            opts.append(true);
        }
        if self.0 & Self::EXCL != 0 {
            opts.create_new(true);
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_read_drains_only_whats_buffered() {
        let mut fd = FileDescriptor::new_console();
        fd.feed_console_input(b"hi");
        let bytes = fd.read(10).unwrap();
        assert_eq!(bytes, b"hi");
        assert!(fd.console_input_empty());
    }

    #[test]
    fn closed_descriptor_rejects_operations() {
        let mut fd = FileDescriptor::new_console();
        fd.close();
        assert!(fd.read(1).is_err());
        assert!(fd.write(b"x").is_err());
    }

    #[test]
    fn open_flags_map_rdwr_and_creat() {
        let flags = OpenFlags(0x03 | 0x10);
        let opts = flags.to_open_options();
        // OpenOptions has no public getters; exercised indirectly via open() integration tests.
        let _ = opts;
    }
}
