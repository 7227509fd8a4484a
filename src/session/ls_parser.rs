//! Parser for `ls -la` output, used by the shell backend
//!
//! The input is text meant for humans, so this is best effort against the
//! POSIX long format in the `C` locale:
//!
//! ```text
//! total 12
//! drwxr-xr-x 2 user user 4096 Jan  1 00:00 subdir
//! -rw-r--r-- 1 user user   17 Feb  2 10:00 note.txt
//! crw-rw-rw- 1 root root 1, 3 Mar  3  2023 null
//! ```
//!
//! Known to break on: localized dates (run with `LC_ALL=C`), names with
//! leading whitespace or embedded newlines, and `ls` builds that print extra
//! columns. Anything unexpected becomes a [`SessionError::Parse`].

use super::entry::Entry;
use super::error::SessionError;

/// Listing command whose output [`parse_listing`] understands
pub const LIST_COMMAND: &str = "LC_ALL=C ls -la";

const DATE_FIELDS: usize = 3;

/// Column positions for one line, chosen by the file type character
struct FieldLayout {
    /// `None` for device nodes, which print `major, minor` instead
    size: Option<usize>,
    date: usize,
}

impl FieldLayout {
    fn for_kind(kind: char) -> Self {
        match kind {
            // char/block devices: mode links owner group major, minor date.. name
            'c' | 'b' => FieldLayout {
                size: None,
                date: 6,
            },
            // everything else, directories included (they report their block size)
            _ => FieldLayout {
                size: Some(4),
                date: 5,
            },
        }
    }

    fn name(&self) -> usize {
        self.date + DATE_FIELDS
    }
}

/// Parse the full output of [`LIST_COMMAND`], skipping `.` and `..`
pub fn parse_listing(output: &str) -> Result<Vec<Entry>, SessionError> {
    let mut entries = Vec::new();

    for (index, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // Summary line emitted before the entries
        if index == 0 && line.starts_with("total ") {
            continue;
        }

        let entry = parse_line(line)?;
        if entry.name() == "." || entry.name() == ".." {
            continue;
        }
        entries.push(entry);
    }

    Ok(entries)
}

/// Parse a single long-format line
pub fn parse_line(line: &str) -> Result<Entry, SessionError> {
    let fields = split_fields(line);

    let (_, mode) = *fields
        .first()
        .ok_or_else(|| SessionError::parse(line, "empty line"))?;
    if !is_mode_field(mode) {
        return Err(SessionError::parse(line, "first field is not a mode string"));
    }

    let kind = mode.chars().next().unwrap_or('-');
    let layout = FieldLayout::for_kind(kind);

    if fields.len() <= layout.name() {
        return Err(SessionError::parse(
            line,
            format!(
                "expected at least {} fields, found {}",
                layout.name() + 1,
                fields.len()
            ),
        ));
    }

    let size = match layout.size {
        Some(i) => fields[i]
            .1
            .parse::<u64>()
            .map_err(|_| SessionError::parse(line, format!("invalid size {:?}", fields[i].1)))?,
        None => 0,
    };

    let modified = fields[layout.date..layout.name()]
        .iter()
        .map(|(_, f)| *f)
        .collect::<Vec<_>>()
        .join(" ");

    // The name runs to the end of the line so inner spaces survive
    let mut name = &line[fields[layout.name()].0..];
    if kind == 'l' {
        if let Some((link, _target)) = name.split_once(" -> ") {
            name = link;
        }
    }

    Ok(Entry::new(name, size, modified, mode, kind == 'd'))
}

fn is_mode_field(field: &str) -> bool {
    let mut chars = field.chars();
    let kind_ok = matches!(
        chars.next(),
        Some('-' | 'd' | 'l' | 'c' | 'b' | 'p' | 's')
    );
    // 9 permission chars, optionally followed by an ACL/xattr marker (+, @, .)
    kind_ok && (field.len() == 10 || field.len() == 11)
}

/// Whitespace-separated fields with their byte offsets into `line`
fn split_fields(line: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                fields.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        fields.push((s, &line[s..]));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_line() {
        let entry = parse_line("drwxr-xr-x 2 user user 4096 Jan 1 00:00 subdir").unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name(), "subdir");
        assert_eq!(entry.size(), 4096);
        assert_eq!(entry.permissions(), "drwxr-xr-x");
        assert_eq!(entry.modified(), "Jan 1 00:00");
    }

    #[test]
    fn test_file_line() {
        let entry = parse_line("-rw-r--r-- 1 user user 17 Feb 2 10:00 note.txt").unwrap();
        assert!(!entry.is_dir());
        assert_eq!(entry.name(), "note.txt");
        assert_eq!(entry.size(), 17);
        assert_eq!(entry.modified(), "Feb 2 10:00");
    }

    #[test]
    fn test_aligned_columns_and_spaces_in_name() {
        let entry =
            parse_line("-rw-r--r--  1 user staff   120 Mar 14  2023 quarterly report.pdf").unwrap();
        assert_eq!(entry.name(), "quarterly report.pdf");
        assert_eq!(entry.size(), 120);
        assert_eq!(entry.modified(), "Mar 14 2023");
    }

    #[test]
    fn test_symlink_and_device_lines() {
        let link = parse_line("lrwxrwxrwx 1 root root 7 Jan 5 12:00 bin -> usr/bin").unwrap();
        assert_eq!(link.name(), "bin");
        assert!(!link.is_dir());

        let dev = parse_line("crw-rw-rw- 1 root root 1, 3 Mar 3 2023 null").unwrap();
        assert_eq!(dev.name(), "null");
        assert_eq!(dev.size(), 0);
        assert_eq!(dev.modified(), "Mar 3 2023");
    }

    #[test]
    fn test_acl_marker_accepted() {
        let entry = parse_line("drwxr-xr-x+ 3 user user 4096 Jan 1 00:00 shared").unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.permissions(), "drwxr-xr-x+");
    }

    #[test]
    fn test_short_line_is_parse_error() {
        let err = parse_line("drwxr-xr-x 2 user user 4096").unwrap_err();
        match err {
            SessionError::Parse { line, reason } => {
                assert_eq!(line, "drwxr-xr-x 2 user user 4096");
                assert!(reason.contains("fields"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_size_and_bad_mode() {
        assert!(matches!(
            parse_line("-rw-r--r-- 1 user user big Feb 2 10:00 f"),
            Err(SessionError::Parse { .. })
        ));
        assert!(matches!(
            parse_line("ls: cannot open directory '.': Permission denied"),
            Err(SessionError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_listing() {
        let output = "total 16\n\
            drwxr-xr-x 3 user user 4096 Jan 1 00:00 .\n\
            drwxr-xr-x 9 user user 4096 Jan 1 00:00 ..\n\
            drwxr-xr-x 2 user user 4096 Jan 1 00:00 subdir\n\
            -rw-r--r-- 1 user user 17 Feb 2 10:00 note.txt\n\
            \n";
        let entries = parse_listing(output).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["subdir", "note.txt"]);
    }

    #[test]
    fn test_parse_listing_fails_whole_listing_on_bad_line() {
        let output = "total 4\n-rw-r--r-- 1 user user 17 Feb 2 10:00 ok\ngarbage\n";
        assert!(matches!(
            parse_listing(output),
            Err(SessionError::Parse { line, .. }) if line == "garbage"
        ));
    }

    #[test]
    fn test_empty_directory_listing() {
        let output = "total 0\n\
            drwxr-xr-x 2 user user 4096 Jan 1 00:00 .\n\
            drwxr-xr-x 9 user user 4096 Jan 1 00:00 ..\n";
        assert!(parse_listing(output).unwrap().is_empty());
    }
}
