//! `LIST`/`NLST` entry formatting (spec §4.3 "Listing", §3 "Directory
//! iterator").
//!
//! No teacher analogue (the teacher's directory listing is WebDAV
//! PROPFIND XML, explicitly out of scope here); formatted in the
//! conventional UNIX `ls -l` shape FTP clients expect, using `time` for the
//! timestamp column the same way the teacher's `util::systemtime_to_*`
//! helpers do.

use time::OffsetDateTime;

use crate::adapters::fs::Entry;

/// One UNIX-`ls`-style line for `LIST`, without the trailing CRLF (the
/// transfer loop appends that per spec §4.3's ASCII/binary policy).
pub fn format_list_entry(entry: &Entry) -> String {
    let kind = if entry.is_dir { 'd' } else { '-' };
    let perms = if entry.is_dir { "rwxr-xr-x" } else { "rw-r--r--" };
    let size = entry.size.unwrap_or(0);
    let stamp = entry
        .mtime
        .and_then(|t| OffsetDateTime::from_unix_timestamp(t).ok())
        .map(format_ls_timestamp)
        .unwrap_or_else(|| "Jan  1  1970".to_string());
    format!("{kind}{perms} 1 paper paper {size:>10} {stamp} {}", entry.name)
}

/// One bare name per line for `NLST`.
pub fn format_nlst_entry(entry: &Entry) -> String {
    entry.name.clone()
}

fn format_ls_timestamp(dt: OffsetDateTime) -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let month = MONTHS[dt.month() as usize - 1];
    format!("{month} {:>2} {:02}:{:02}", dt.day(), dt.hour(), dt.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_line_includes_name_and_size() {
        let entry = Entry {
            name: "readme.txt".to_string(),
            is_dir: false,
            size: Some(5),
            mtime: Some(0),
        };
        let line = format_list_entry(&entry);
        assert!(line.starts_with('-'));
        assert!(line.contains("readme.txt"));
        assert!(line.contains('5'));
    }

    #[test]
    fn nlst_line_is_bare_name() {
        let entry = Entry {
            name: "sub".to_string(),
            is_dir: true,
            size: None,
            mtime: None,
        };
        assert_eq!(format_nlst_entry(&entry), "sub");
    }
}
