//! Normalized directory entries

use serde::Serialize;

use crate::sftp::RemoteDirEntry;
use crate::utils::bytes_human_readable;

/// One remote directory entry, identical in shape for both backends
///
/// Built fresh by every listing and only valid for the directory it was
/// listed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    name: String,
    size: u64,
    modified: String,
    permissions: String,
    is_dir: bool,
}

/// What a properties view shows for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryProperties {
    pub name: String,
    pub size: String,
    pub last_modified: String,
    pub permissions: String,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        modified: impl Into<String>,
        permissions: impl Into<String>,
        is_dir: bool,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            modified: modified.into(),
            permissions: permissions.into(),
            is_dir,
        }
    }

    pub(crate) fn from_remote(entry: RemoteDirEntry) -> Self {
        Self {
            size: entry.metadata.size,
            modified: entry.metadata.modified_display(),
            permissions: entry.metadata.mode_string(),
            is_dir: entry.metadata.is_dir,
            name: entry.name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes (directories report their block size)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last-modified time as display text
    pub fn modified(&self) -> &str {
        &self.modified
    }

    /// Mode as `drwxr-xr-x`-style text
    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn display_size(&self) -> String {
        bytes_human_readable(self.size)
    }

    /// Get icon name for UI
    pub fn icon(&self) -> &'static str {
        if self.is_dir {
            "folder"
        } else {
            "file"
        }
    }

    pub fn properties(&self) -> EntryProperties {
        EntryProperties {
            name: self.name.clone(),
            size: self.display_size(),
            last_modified: self.modified.clone(),
            permissions: self.permissions.clone(),
        }
    }
}

/// Directories first, then case-insensitive by name
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        if a.is_dir != b.is_dir {
            return b.is_dir.cmp(&a.is_dir);
        }
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::RemoteMetadata;

    #[test]
    fn test_from_remote() {
        let entry = Entry::from_remote(RemoteDirEntry {
            name: "logs".into(),
            metadata: RemoteMetadata {
                is_dir: true,
                size: 4096,
                mtime: Some(1_704_067_200),
                permissions: Some(0o040755),
            },
        });
        assert_eq!(entry.name(), "logs");
        assert!(entry.is_dir());
        assert_eq!(entry.size(), 4096);
        assert_eq!(entry.permissions(), "drwxr-xr-x");
        assert_eq!(entry.modified(), "2024-01-01 00:00");
        assert_eq!(entry.icon(), "folder");
    }

    #[test]
    fn test_properties() {
        let entry = Entry::new("note.txt", 1500, "Feb 2 10:00", "-rw-r--r--", false);
        let props = entry.properties();
        assert_eq!(props.name, "note.txt");
        assert_eq!(props.size, "1.5 KB");
        assert_eq!(props.last_modified, "Feb 2 10:00");
        assert_eq!(props.permissions, "-rw-r--r--");
        assert_eq!(entry.icon(), "file");
    }

    #[test]
    fn test_sort_entries() {
        let mut entries = vec![
            Entry::new("b.txt", 1, "", "-rw-r--r--", false),
            Entry::new("Zeta", 4096, "", "drwxr-xr-x", true),
            Entry::new("A.txt", 1, "", "-rw-r--r--", false),
            Entry::new("alpha", 4096, "", "drwxr-xr-x", true),
        ];
        sort_entries(&mut entries);
        let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["alpha", "Zeta", "A.txt", "b.txt"]);
    }
}
