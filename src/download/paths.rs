use std::path::{Path, PathBuf};

/// Characters that are invalid in a path component on common filesystems,
/// plus `%` which the catalog uses for escapes.
fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%') || c.is_control()
}

/// Clean a name by removing forbidden characters and surrounding whitespace.
///
/// Returns an empty string when nothing usable is left, including names made
/// only of dots (`.` and `..` must never become path components).
pub fn clean_filename(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !is_forbidden(*c)).collect();
    let trimmed = cleaned.trim();
    if trimmed.chars().all(|c| c == '.') {
        return String::new();
    }
    trimmed.to_string()
}

/// Directory name for an order, derived from its title.
///
/// Total: falls back to `fallback` when the title cleans down to nothing.
pub fn order_dir_name(title: &str, fallback: &str) -> String {
    let cleaned = clean_filename(title);
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Destination directory for an order under the download root.
pub fn order_directory(root: &Path, title: &str, fallback: &str) -> PathBuf {
    root.join(order_dir_name(title, fallback))
}

/// Local path of a photo inside an order directory, or `None` when the
/// filename cleans down to nothing.
pub fn local_download_path(directory: &Path, filename: &str) -> Option<PathBuf> {
    let clean = clean_filename(filename);
    if clean.is_empty() {
        None
    } else {
        Some(directory.join(clean))
    }
}

/// Path a download is streamed into before being renamed into place.
pub fn part_path(download_path: &Path) -> PathBuf {
    let mut name = download_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    download_path.with_file_name(name)
}
