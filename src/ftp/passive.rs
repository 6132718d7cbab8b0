//! Passive-mode listener pool (spec §3 "Passive listener pool", §9
//! "Passive-port rotation").
//!
//! No teacher analogue (`dav-server` has no FTP data-channel concept);
//! grounded secondarily on the PASV tuple format documented by
//! `other_examples/bb6383e1_NicksWorld-ftp_lib` (`parse_pasv_addr`), which
//! parses the same `(h1,h2,h3,h4,p1,p2)` reply this pool formats. A small
//! cursor wrapped by the net adapter, per spec §9 ("prefer a value wrapped
//! in the net adapter rather than global state").

use crate::adapters::net::{Listener, NetAdapter};
use crate::error::Result;

/// Rotates over a fixed inclusive port range, wrapping at the upper bound.
pub struct PassivePool {
    lo: u16,
    hi: u16,
    cursor: u16,
}

impl PassivePool {
    pub fn new(range: (u16, u16)) -> Self {
        PassivePool {
            lo: range.0,
            hi: range.1,
            cursor: range.0,
        }
    }

    /// Bind the next port that succeeds, starting from the cursor and
    /// wrapping once around the whole range before giving up.
    pub fn allocate(&mut self, net: &mut dyn NetAdapter) -> Result<Box<dyn Listener>> {
        let span = (self.hi - self.lo) as u32 + 1;
        let mut last_err = None;
        for _ in 0..span {
            let port = self.cursor;
            self.cursor = if self.cursor >= self.hi { self.lo } else { self.cursor + 1 };
            match net.bind(port) {
                Ok(listener) => return Ok(listener),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(crate::error::Error::Io(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "no passive port available",
        ))))
    }
}

/// Format the `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply body.
pub fn format_tuple(ipv4: [u8; 4], port: u16) -> String {
    let p1 = (port / 256) as u8;
    let p2 = (port % 256) as u8;
    format!(
        "Entering Passive Mode ({},{},{},{},{},{})",
        ipv4[0], ipv4[1], ipv4[2], ipv4[3], p1, p2
    )
}

/// Parse an `(h1,h2,h3,h4,p1,p2)` tuple back into an address and port — the
/// inverse of [`format_tuple`], exercised by spec §8's PASV round-trip
/// property.
pub fn parse_tuple(body: &str) -> Option<([u8; 4], u16)> {
    let start = body.find('(')?;
    let end = body.find(')')?;
    let nums: Vec<u16> = body[start + 1..end]
        .split(',')
        .map(|s| s.trim().parse::<u16>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if nums.len() != 6 {
        return None;
    }
    let ip = [nums[0] as u8, nums[1] as u8, nums[2] as u8, nums[3] as u8];
    let port = nums[4] * 256 + nums[5];
    Some((ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memnet::MemNet;

    #[test]
    fn tuple_round_trips() {
        let formatted = format_tuple([10, 0, 0, 5], 50123);
        let (ip, port) = parse_tuple(&formatted).unwrap();
        assert_eq!(ip, [10, 0, 0, 5]);
        assert_eq!(port, 50123);
    }

    #[test]
    fn pool_wraps_at_upper_bound() {
        let mut net = MemNet::default();
        let mut pool = PassivePool::new((50000, 50001));
        let a = pool.allocate(&mut net).unwrap();
        assert_eq!(a.local_port(), 50000);
        let b = pool.allocate(&mut net).unwrap();
        assert_eq!(b.local_port(), 50001);
        let c = pool.allocate(&mut net).unwrap();
        assert_eq!(c.local_port(), 50000);
    }
}
