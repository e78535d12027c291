//! Path segment validation and joining for tree paths

use crate::error::GraftError;

/// Validate a single path segment (one mapping key).
///
/// Segments become path components in the remote tree, so they must not be
/// empty, contain separators, or name the current or parent directory.
pub fn validate_segment(segment: &str) -> Result<(), GraftError> {
    if segment.is_empty() {
        return Err(GraftError::InvalidPath(
            "path segment cannot be empty".to_string(),
        ));
    }
    if segment == "." || segment == ".." {
        return Err(GraftError::InvalidPath(format!(
            "path segment '{}' is reserved",
            segment
        )));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(GraftError::InvalidPath(format!(
            "path segment '{}' contains a separator; nest a directory instead",
            segment
        )));
    }
    if segment.contains('\0') {
        return Err(GraftError::InvalidPath(
            "path segment contains a NUL byte".to_string(),
        ));
    }
    Ok(())
}

/// Join a parent path and a child segment with a single slash.
///
/// An empty parent means the segment sits at the tree root and is returned
/// as-is, so joined paths never start with a slash.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// Split a slash-joined path into its segments.
pub fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_from_root_has_no_leading_slash() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "x.txt"), "a/x.txt");
        assert_eq!(join("a/b", "c"), "a/b/c");
    }

    #[test]
    fn test_validate_segment_accepts_normal_names() {
        assert!(validate_segment("x.txt").is_ok());
        assert!(validate_segment("notes with spaces.md").is_ok());
        assert!(validate_segment(".gitignore").is_ok());
    }

    #[test]
    fn test_validate_segment_rejects_bad_names() {
        assert!(validate_segment("").is_err());
        assert!(validate_segment(".").is_err());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("a\\b").is_err());
        assert!(validate_segment("a\0b").is_err());
    }

    #[test]
    fn test_split_round_trips_join() {
        let path = join(&join("", "a"), "b");
        let segments: Vec<&str> = split(&path).collect();
        assert_eq!(segments, vec!["a", "b"]);
    }
}
