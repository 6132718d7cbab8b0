//! `std::fs`-backed [`FsAdapter`] (spec §4.2).
//!
//! Grounded on the teacher's `LocalFs` (`fs/localfs.rs`): same
//! responsibilities (translate virtual path to an absolute host path, then
//! delegate to the real filesystem), but synchronous throughout, since this
//! engine has no async runtime to hand `tokio::fs` calls to.

use std::fs;
use std::io::{Read, Write};
use std::time::UNIX_EPOCH;

use crate::adapters::fs::{DirIter, Entry, FsAdapter, Reader, Stat, Writer};
use crate::error::{Error, Result};
use crate::path;

/// Serves a real directory on the host filesystem, rooted at
/// [`path::HOST_ROOT`].
pub struct StdFsAdapter;

impl StdFsAdapter {
    pub fn new() -> Self {
        StdFsAdapter
    }

    fn host(path: &str) -> Result<String> {
        crate::path::to_host(path)
    }
}

impl Default for StdFsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io_err(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound,
        std::io::ErrorKind::AlreadyExists => Error::Exists,
        _ => Error::Io(e),
    }
}

impl FsAdapter for StdFsAdapter {
    fn stat(&self, p: &str) -> Result<Stat> {
        let host = Self::host(p)?;
        let meta = fs::metadata(&host).map_err(map_io_err)?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        Ok(Stat {
            size: meta.len(),
            is_dir: meta.is_dir(),
            mtime,
        })
    }

    fn open_read(&self, p: &str) -> Result<Box<dyn Reader + '_>> {
        let host = Self::host(p)?;
        let meta = fs::metadata(&host).map_err(map_io_err)?;
        if meta.is_dir() {
            return Err(Error::IsDir);
        }
        let file = fs::File::open(&host).map_err(map_io_err)?;
        Ok(Box::new(StdReader(file)))
    }

    fn open_write_trunc(&self, p: &str) -> Result<Box<dyn Writer + '_>> {
        let host = Self::host(p)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&host)
            .map_err(map_io_err)?;
        Ok(Box::new(StdWriter(file)))
    }

    fn dir_open(&self, p: &str) -> Result<Box<dyn DirIter + '_>> {
        let host = Self::host(p)?;
        let iter = fs::read_dir(&host).map_err(map_io_err)?;
        Ok(Box::new(StdDirIter { iter }))
    }

    fn delete(&self, p: &str) -> Result<()> {
        let host = Self::host(p)?;
        fs::remove_file(&host).map_err(map_io_err)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let hf = Self::host(from)?;
        let ht = Self::host(to)?;
        fs::rename(&hf, &ht).map_err(|e| {
            if e.raw_os_error() == Some(libc_exdev()) {
                Error::CrossDevice
            } else {
                map_io_err(e)
            }
        })
    }

    fn make_dir(&self, p: &str) -> Result<()> {
        let host = Self::host(p)?;
        fs::create_dir(&host).map_err(map_io_err)
    }

    fn remove_dir(&self, p: &str) -> Result<()> {
        let host = Self::host(p)?;
        fs::remove_dir(&host).map_err(|e| match e.raw_os_error() {
            Some(code) if code == libc_enotempty() => Error::NotEmpty,
            _ => map_io_err(e),
        })
    }
}

/// `EXDEV`'s numeric value on Linux, without pulling in the `libc` crate
/// just for one constant.
fn libc_exdev() -> i32 {
    18
}

/// `ENOTEMPTY`'s numeric value on Linux.
fn libc_enotempty() -> i32 {
    39
}

struct StdReader(fs::File);
impl Reader for StdReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf).map_err(Error::Io)
    }
}

struct StdWriter(fs::File);
impl Writer for StdWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.0.write(buf).map_err(Error::Io)
    }
}

struct StdDirIter {
    iter: fs::ReadDir,
}
impl DirIter for StdDirIter {
    fn next(&mut self) -> Result<Option<Entry>> {
        loop {
            match self.iter.next() {
                None => return Ok(None),
                Some(Err(e)) => return Err(map_io_err(e)),
                Some(Ok(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name == "." || name == ".." {
                        continue;
                    }
                    let meta = entry.metadata().map_err(map_io_err)?;
                    let mtime = meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs() as i64);
                    return Ok(Some(Entry {
                        name,
                        is_dir: meta.is_dir(),
                        size: Some(meta.len()),
                        mtime,
                    }));
                }
            }
        }
    }
}
