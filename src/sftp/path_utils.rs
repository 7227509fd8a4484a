//! Remote path utilities
//!
//! Remote SFTP paths always use `/` as separator, even on Windows servers, so
//! everything here is plain string work with no `std::path` involvement.

/// Check if a remote SFTP path is absolute.
pub fn is_absolute_remote_path(path: &str) -> bool {
    path.starts_with('/')
}

/// Join remote SFTP path components using `/` separator.
pub fn join_remote_path(base: &str, component: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, component)
    } else {
        format!("{}/{}", base, component)
    }
}

/// Lexically normalize an absolute remote path.
///
/// Collapses repeated slashes, drops `.` segments and resolves `..` against
/// the preceding segment. `..` at the root stays at the root. No I/O, so
/// symlinks are not followed.
pub fn normalize_remote_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Parent of a normalized absolute path; the root is its own parent.
pub fn parent_remote_path(path: &str) -> String {
    normalize_remote_path(&join_remote_path(path, ".."))
}

/// Whether `path` is `ancestor` itself or lies underneath it
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let path = normalize_remote_path(path);
    let ancestor = normalize_remote_path(ancestor);
    if ancestor == "/" {
        return true;
    }
    path == ancestor || path.starts_with(&format!("{}/", ancestor))
}
