//! Buildpack id escaping for on-disk directory names.

/// Escape a buildpack id for use as a directory name.
///
/// Ids may contain `/` (e.g. `example/nodejs`), which is unsafe in a single
/// path segment. The catalog and the layers directory both use the escaped
/// form; `___` is stable and never produced by unescaped ids in practice.
pub fn escape_id(id: &str) -> String {
    id.replace('/', "___")
}
