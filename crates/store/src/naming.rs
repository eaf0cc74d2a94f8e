//! crates/store/src/naming.rs
//! Deterministic cache file names.

/// Extension of the canonical cache file.
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Extension of backup files left by older writers; always safe to delete.
pub const BACKUP_EXTENSION: &str = "bak";

/// Characters rejected by at least one common filesystem.
const INVALID_CHARS: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/'];

/// Returns the cache file name for `source`: [`escape_source`] plus the
/// snapshot extension.
///
/// # Examples
///
/// ```
/// use store::cache_file_name;
///
/// assert_eq!(cache_file_name("nuget.org"), "nuget.org.snapshot");
/// assert_eq!(cache_file_name("https://api/v3"), "https_58__47__47_api_47_v3.snapshot");
/// assert_eq!(cache_file_name("my_feed"), "my__feed.snapshot");
/// ```
#[must_use]
pub fn cache_file_name(source: &str) -> String {
    let mut name = escape_source(source);
    name.push('.');
    name.push_str(SNAPSHOT_EXTENSION);
    name
}

/// Maps a source id to a single filesystem-safe path component.
///
/// Underscores are doubled and each invalid character (the set above plus
/// characters below U+0020) is written as `_<ordinal>_`. Because a literal
/// underscore never appears alone, the mapping is injective.
#[must_use]
pub fn escape_source(source: &str) -> String {
    let mut name = String::with_capacity(source.len() + SNAPSHOT_EXTENSION.len() + 1);
    for ch in source.chars() {
        if ch == '_' {
            name.push_str("__");
        } else if u32::from(ch) < 0x20 || INVALID_CHARS.contains(&ch) {
            name.push('_');
            name.push_str(&u32::from(ch).to_string());
            name.push('_');
        } else {
            name.push(ch);
        }
    }
    name
}
