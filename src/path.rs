//! Keyword paths and filesystem containment checks.
//!
//! A [`KeywordPath`] addresses an entry inside a document the way a file-system
//! path addresses a file: `["boundaryField", "inlet", "type"]` names the `type`
//! entry of the `inlet` sub-dictionary of `boundaryField`. The empty path
//! addresses the standalone (un-keyed) data block.
//!
//! ```rust
//! use foamdict::KeywordPath;
//!
//! let path = KeywordPath::from(["boundaryField", "inlet", "type"]);
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.parent(), Some(KeywordPath::from(["boundaryField", "inlet"])));
//! assert_eq!(path.to_string(), "boundaryField/inlet/type");
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Ordered tuple of keyword segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeywordPath(Vec<String>);

impl KeywordPath {
    /// The empty path, addressing standalone data.
    #[must_use]
    pub const fn root() -> Self {
        KeywordPath(Vec::new())
    }

    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        KeywordPath(segments)
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the standalone-data path.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The enclosing path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<KeywordPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(KeywordPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> KeywordPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        KeywordPath(segments)
    }

    /// Appends all segments of `other`.
    #[must_use]
    pub fn join(&self, other: &KeywordPath) -> KeywordPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        KeywordPath(segments)
    }

    /// Directive paths end in a `#`-prefixed segment and may repeat within a scope.
    #[must_use]
    pub fn is_directive(&self) -> bool {
        self.last().is_some_and(|last| last.starts_with('#'))
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &KeywordPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns `true` if `self` lies strictly below `prefix`.
    #[must_use]
    pub fn is_descendant_of(&self, prefix: &KeywordPath) -> bool {
        self.0.len() > prefix.0.len() && self.starts_with(prefix)
    }
}

impl fmt::Display for KeywordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<standalone>");
        }
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for KeywordPath {
    fn from(segment: &str) -> Self {
        KeywordPath(vec![segment.to_string()])
    }
}

impl From<String> for KeywordPath {
    fn from(segment: String) -> Self {
        KeywordPath(vec![segment])
    }
}

impl<const N: usize> From<[&str; N]> for KeywordPath {
    fn from(segments: [&str; N]) -> Self {
        KeywordPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[&str]> for KeywordPath {
    fn from(segments: &[&str]) -> Self {
        KeywordPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for KeywordPath {
    fn from(segments: Vec<String>) -> Self {
        KeywordPath(segments)
    }
}

impl From<&KeywordPath> for KeywordPath {
    fn from(path: &KeywordPath) -> Self {
        path.clone()
    }
}

impl From<()> for KeywordPath {
    fn from((): ()) -> Self {
        KeywordPath::root()
    }
}

/// Joins `relative` onto `root` lexically, refusing results that leave `root`.
///
/// Absolute paths and `..` components that climb above `root` yield
/// [`Error::OutsideRoot`]. The filesystem is not consulted.
pub fn resolve_within(root: &Path, relative: &Path) -> Result<PathBuf> {
    let outside = || Error::OutsideRoot {
        path: relative.to_path_buf(),
        root: root.to_path_buf(),
    };

    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(outside());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(outside()),
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(parts);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_detection() {
        assert!(KeywordPath::from("#include").is_directive());
        assert!(KeywordPath::from(["sub", "#includeEtc"]).is_directive());
        assert!(!KeywordPath::from(["#sub", "key"]).is_directive());
        assert!(!KeywordPath::root().is_directive());
    }

    #[test]
    fn test_descendants() {
        let parent = KeywordPath::from("a");
        assert!(KeywordPath::from(["a", "b"]).is_descendant_of(&parent));
        assert!(!parent.is_descendant_of(&parent));
        assert!(!KeywordPath::from(["ab", "c"]).is_descendant_of(&parent));
    }

    #[test]
    fn test_display_root() {
        assert_eq!(KeywordPath::root().to_string(), "<standalone>");
    }

    #[test]
    fn test_resolve_within_accepts_inner_paths() {
        let root = Path::new("/case");
        let resolved = resolve_within(root, Path::new("system/../constant/./polyMesh")).unwrap();
        assert_eq!(resolved, PathBuf::from("/case/constant/polyMesh"));
    }

    #[test]
    fn test_resolve_within_rejects_escape() {
        let root = Path::new("/case");
        assert!(matches!(
            resolve_within(root, Path::new("../other")),
            Err(Error::OutsideRoot { .. })
        ));
        assert!(matches!(
            resolve_within(root, Path::new("/etc/passwd")),
            Err(Error::OutsideRoot { .. })
        ));
    }
}
