//! SFTP data types

use chrono::DateTime;
use russh_sftp::protocol::FileAttributes;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFLNK: u32 = 0o120000;
const S_IFCHR: u32 = 0o020000;
const S_IFBLK: u32 = 0o060000;
const S_IFIFO: u32 = 0o010000;
const S_IFSOCK: u32 = 0o140000;

/// Metadata of one remote path, as reported by the SFTP server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub is_dir: bool,
    pub size: u64,
    /// Seconds since the epoch
    pub mtime: Option<i64>,
    /// Full st_mode, including file type bits when the server sends them
    pub permissions: Option<u32>,
}

impl From<&FileAttributes> for RemoteMetadata {
    fn from(attrs: &FileAttributes) -> Self {
        Self {
            is_dir: attrs.is_dir(),
            size: attrs.size.unwrap_or(0),
            mtime: attrs.mtime.map(i64::from),
            permissions: attrs.permissions,
        }
    }
}

impl RemoteMetadata {
    /// `drwxr-xr-x`-style rendering of the mode
    pub fn mode_string(&self) -> String {
        mode_string(self.permissions.unwrap_or(0), self.is_dir)
    }

    /// `YYYY-MM-DD HH:MM` in UTC, or empty when the server sent no mtime
    pub fn modified_display(&self) -> String {
        self.mtime.map(format_mtime).unwrap_or_default()
    }
}

/// One entry from a remote directory read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDirEntry {
    pub name: String,
    pub metadata: RemoteMetadata,
}

/// Render st_mode bits the way `ls -l` does
pub fn mode_string(mode: u32, is_dir: bool) -> String {
    let kind = match mode & S_IFMT {
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        S_IFCHR => 'c',
        S_IFBLK => 'b',
        S_IFIFO => 'p',
        S_IFSOCK => 's',
        _ if is_dir => 'd',
        _ => '-',
    };

    let bit = |mask: u32, c: char| if mode & mask != 0 { c } else { '-' };
    // setuid/setgid/sticky replace the execute slot
    let special = |exec_mask: u32, special_mask: u32, set: char, unset: char| {
        match (mode & exec_mask != 0, mode & special_mask != 0) {
            (true, true) => set,
            (false, true) => unset,
            (true, false) => 'x',
            (false, false) => '-',
        }
    };

    let mut s = String::with_capacity(10);
    s.push(kind);
    s.push(bit(0o400, 'r'));
    s.push(bit(0o200, 'w'));
    s.push(special(0o100, 0o4000, 's', 'S'));
    s.push(bit(0o040, 'r'));
    s.push(bit(0o020, 'w'));
    s.push(special(0o010, 0o2000, 's', 'S'));
    s.push(bit(0o004, 'r'));
    s.push(bit(0o002, 'w'));
    s.push(special(0o001, 0o1000, 't', 'T'));
    s
}

/// Format an epoch timestamp with minute precision
pub fn format_mtime(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(0o040755, true), "drwxr-xr-x");
        assert_eq!(mode_string(0o100644, false), "-rw-r--r--");
        assert_eq!(mode_string(0o120777, false), "lrwxrwxrwx");
        assert_eq!(mode_string(0o104755, false), "-rwsr-xr-x");
        assert_eq!(mode_string(0o041777, true), "drwxrwxrwt");
        assert_eq!(mode_string(0o100600 | 0o2000, false), "-rw---S---");
    }

    #[test]
    fn test_mode_string_without_type_bits() {
        assert_eq!(mode_string(0o755, true), "drwxr-xr-x");
        assert_eq!(mode_string(0o644, false), "-rw-r--r--");
    }

    #[test]
    fn test_format_mtime() {
        assert_eq!(format_mtime(0), "1970-01-01 00:00");
        assert_eq!(format_mtime(1_704_067_200), "2024-01-01 00:00");
    }

    #[test]
    fn test_metadata_display() {
        let meta = RemoteMetadata {
            is_dir: true,
            permissions: Some(0o040700),
            mtime: Some(86_400),
            ..Default::default()
        };
        assert_eq!(meta.mode_string(), "drwx------");
        assert_eq!(meta.modified_display(), "1970-01-02 00:00");
        assert_eq!(RemoteMetadata::default().modified_display(), "");
    }
}
