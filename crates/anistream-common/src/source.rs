//! Classification of episode video sources.
//!
//! A source string stored on an episode server is either an absolute remote
//! URL (anything starting with `http`) or a path relative to the content
//! root that local files are served from.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Resolved pointer to playable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum VideoSource {
    /// Path relative to the content root.
    Local(String),
    /// Absolute URL the client is redirected to.
    Remote(String),
}

impl VideoSource {
    /// Classify a raw source string by its prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use anistream_common::VideoSource;
    ///
    /// assert!(VideoSource::classify("https://cdn.example.com/a.mp4").is_remote());
    /// assert!(!VideoSource::classify("one-piece/ep1.mp4").is_remote());
    /// ```
    pub fn classify(raw: &str) -> Self {
        if raw.starts_with("http") {
            VideoSource::Remote(raw.to_string())
        } else {
            VideoSource::Local(raw.to_string())
        }
    }

    /// Whether the source points at a remote URL.
    pub fn is_remote(&self) -> bool {
        matches!(self, VideoSource::Remote(_))
    }

    /// The raw source string.
    pub fn as_str(&self) -> &str {
        match self {
            VideoSource::Local(s) | VideoSource::Remote(s) => s,
        }
    }
}

/// Join a relative local source against the content root.
///
/// Leading separators are ignored so `/show/ep1.mp4` and `show/ep1.mp4`
/// resolve identically. Returns `None` when the source is empty or contains
/// a component (`..`, a drive prefix) that could escape the root.
pub fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let trimmed = relative.trim_start_matches(['/', '\\']);
    if trimmed.is_empty() {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_prefix() {
        assert_eq!(
            VideoSource::classify("http://example.com/v.mp4"),
            VideoSource::Remote("http://example.com/v.mp4".into())
        );
        assert_eq!(
            VideoSource::classify("https://example.com/video.mp4"),
            VideoSource::Remote("https://example.com/video.mp4".into())
        );
        assert_eq!(
            VideoSource::classify("naruto/01.mp4"),
            VideoSource::Local("naruto/01.mp4".into())
        );
    }

    #[test]
    fn resolve_relative_paths() {
        let root = Path::new("/srv/videos");
        assert_eq!(
            resolve_under(root, "naruto/01.mp4"),
            Some(PathBuf::from("/srv/videos/naruto/01.mp4"))
        );
        assert_eq!(
            resolve_under(root, "/naruto/./01.mp4"),
            Some(PathBuf::from("/srv/videos/naruto/01.mp4"))
        );
    }

    #[test]
    fn resolve_refuses_escapes() {
        let root = Path::new("/srv/videos");
        assert_eq!(resolve_under(root, "../etc/passwd"), None);
        assert_eq!(resolve_under(root, "naruto/../../secret.mp4"), None);
        assert_eq!(resolve_under(root, ""), None);
        assert_eq!(resolve_under(root, "///"), None);
    }
}
