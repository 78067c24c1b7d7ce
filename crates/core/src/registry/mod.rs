//! Static feed registry.
//!
//! Loaded once at startup from a JSON object keyed by feed name:
//!
//! ```json
//! {
//!   "morning-edition": { "id": 3, "url": "https://www.npr.org/programs/morning-edition/" },
//!   "fresh-air": { "id": 13, "url": "https://www.npr.org/programs/fresh-air/", "author": "NPR" }
//! }
//! ```
//!
//! Changes to the file take effect on restart.

pub mod url;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

pub use self::url::{UrlError, canonicalize};
use crate::Error;

/// Presentation metadata and source of one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMetadata {
    pub name: String,
    pub id: u32,
    pub url: ::url::Url,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// On-disk form of a registry entry.
#[derive(Debug, Deserialize)]
struct RawFeed {
    id: u32,
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

/// Read-only mapping from feed name to metadata.
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    feeds: BTreeMap<String, FeedMetadata>,
}

impl FeedRegistry {
    /// Load the registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Registry(format!("failed to read {}: {e}", path.display())))?;
        let registry = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), feeds = registry.len(), "feed registry loaded");
        Ok(registry)
    }

    /// Parse the registry from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: BTreeMap<String, RawFeed> =
            serde_json::from_str(json).map_err(|e| Error::Registry(format!("invalid registry JSON: {e}")))?;

        let mut feeds = BTreeMap::new();
        let mut ids = BTreeMap::new();

        for (name, feed) in raw {
            if name.trim().is_empty() {
                return Err(Error::Registry("feed name must not be empty".into()));
            }
            if let Some(other) = ids.insert(feed.id, name.clone()) {
                return Err(Error::Registry(format!("feeds {other} and {name} share id {}", feed.id)));
            }

            let url = canonicalize(&feed.url).map_err(|e| Error::InvalidUrl(format!("{name}: {e}")))?;
            feeds.insert(
                name.clone(),
                FeedMetadata {
                    name,
                    id: feed.id,
                    url,
                    title: feed.title,
                    author: feed.author,
                    description: feed.description,
                    image: feed.image,
                },
            );
        }

        Ok(Self { feeds })
    }

    /// Look up a feed by name.
    pub fn get(&self, name: &str) -> Option<&FeedMetadata> {
        self.feeds.get(name)
    }

    /// Resolve a request identifier: a feed name, or the feed's numeric id.
    pub fn resolve(&self, id: &str) -> Option<&FeedMetadata> {
        if let Some(feed) = self.feeds.get(id) {
            return Some(feed);
        }
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let numeric: u32 = id.parse().ok()?;
        self.feeds.values().find(|feed| feed.id == numeric)
    }

    /// Feeds in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FeedMetadata> {
        self.feeds.values()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEEDS: &str = r#"{
        "morning-edition": { "id": 3, "url": "https://www.npr.org/programs/morning-edition/" },
        "fresh-air": {
            "id": 13,
            "url": "www.npr.org/programs/fresh-air/",
            "title": "Fresh Air",
            "author": "NPR"
        }
    }"#;

    #[test]
    fn test_from_json() {
        let registry = FeedRegistry::from_json(FEEDS).unwrap();
        assert_eq!(registry.len(), 2);

        let fresh_air = registry.get("fresh-air").unwrap();
        assert_eq!(fresh_air.id, 13);
        assert_eq!(fresh_air.url.as_str(), "https://www.npr.org/programs/fresh-air/");
        assert_eq!(fresh_air.title.as_deref(), Some("Fresh Air"));
        assert!(fresh_air.image.is_none());
    }

    #[test]
    fn test_resolve_by_name_and_id() {
        let registry = FeedRegistry::from_json(FEEDS).unwrap();
        assert_eq!(registry.resolve("morning-edition").unwrap().id, 3);
        assert_eq!(registry.resolve("13").unwrap().name, "fresh-air");
        assert!(registry.resolve("99").is_none());
        assert!(registry.resolve("unknown").is_none());
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve("-3").is_none());
    }

    #[test]
    fn test_get_does_not_match_ids() {
        let registry = FeedRegistry::from_json(FEEDS).unwrap();
        assert!(registry.get("3").is_none());
    }

    #[test]
    fn test_iter_in_name_order() {
        let registry = FeedRegistry::from_json(FEEDS).unwrap();
        let names: Vec<_> = registry.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fresh-air", "morning-edition"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{ "a": { "id": 1, "url": "https://a.example" }, "b": { "id": 1, "url": "https://b.example" } }"#;
        assert!(matches!(FeedRegistry::from_json(json), Err(Error::Registry(_))));
    }

    #[test]
    fn test_bad_url_rejected() {
        let json = r#"{ "a": { "id": 1, "url": "file:///etc/passwd" } }"#;
        assert!(matches!(FeedRegistry::from_json(json), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(FeedRegistry::from_json("[1, 2]"), Err(Error::Registry(_))));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("feeds.json");
        std::fs::write(&path, FEEDS).unwrap();
        let registry = FeedRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = FeedRegistry::load("/nonexistent/feeds.json");
        assert!(matches!(result, Err(Error::Registry(_))));
    }
}
