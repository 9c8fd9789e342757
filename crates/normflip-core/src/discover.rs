//! Normal-map discovery.
//!
//! A file is a candidate when its name contains both "normal" and "map"
//! (case-insensitive, in any order, anywhere in the name) and its
//! extension is one of the supported image formats.

use normflip_io::Format;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Returns true if the file name looks like a normal map.
///
/// ```
/// use normflip_core::looks_like_normal_map;
///
/// assert!(looks_like_normal_map("rock_NORMAL_Map.png"));
/// assert!(looks_like_normal_map("normal_diffusemap.tga"));
/// assert!(!looks_like_normal_map("rock_normal.png"));
/// ```
pub fn looks_like_normal_map(file_name: &str) -> bool {
    let name = file_name.to_lowercase();
    name.contains("normal") && name.contains("map")
}

/// Returns true if the path has one of the supported image extensions.
pub fn is_supported(path: &Path) -> bool {
    Format::from_extension(path) != Format::Unknown
}

fn is_candidate(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .map(|name| looks_like_normal_map(&name.to_string_lossy()))
        .unwrap_or(false);
    name_matches && is_supported(path)
}

/// Finds the normal maps under `root`.
///
/// A file root yields itself if it qualifies; a directory root is searched
/// recursively. The order of the result follows directory traversal and is
/// not guaranteed. Missing roots and unreadable entries contribute nothing.
pub fn discover<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    trace!(root = %root.display(), "discover");

    if root.is_file() {
        return if is_candidate(root) { vec![root.to_path_buf()] } else { Vec::new() };
    }
    if !root.is_dir() {
        debug!(root = %root.display(), "root is neither file nor directory");
        return Vec::new();
    }

    // symlinked directories are not descended into; symlinked files count
    let files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            let file_type = entry.file_type();
            file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
        })
        .map(|entry| entry.into_path())
        .filter(|path| is_candidate(path))
        .collect();

    debug!(root = %root.display(), found = files.len(), "discovery complete");
    files
}
