//! Host adapter contracts (spec §2, §4.2, §9).
//!
//! Grounded on the teacher's `DavFileSystem`/`DavFile`/`DavDirEntry` trait
//! split (`fs/localfs.rs`), turned synchronous and extended with the
//! network and clock capability sets spec §4.2's preamble calls for.

pub mod clock;
pub mod fs;
pub mod memfs;
pub mod memnet;
pub mod net;
#[cfg(feature = "stdfs")]
pub mod stdfs;
#[cfg(feature = "stdfs")]
pub mod stdnet;

pub use clock::{ClockAdapter, SystemClock};
pub use fs::{DirIter, Entry, FsAdapter, Reader, Stat, Writer};
pub use net::{Connection, Listener, NetAdapter};
#[cfg(feature = "stdfs")]
pub use stdfs::StdFsAdapter;
#[cfg(feature = "stdfs")]
pub use stdnet::StdNetAdapter;
