//! Channel and episode extraction from program pages.
//!
//! ### Episodes
//! - Every element carrying a `data-play-all` attribute contributes its
//!   `audioData` segments, in document order.
//!
//! ### Channel fields
//! - Title and author come from the page `<title>` ("Title : Author"),
//!   unless the registry overrides them.
//! - Image: registry override, the branding image, or the first image whose
//!   source mentions the feed name.
//! - Description: registry override or a generated attribution line.

pub mod episodes;

pub use episodes::{Episode, parse_play_all};

use nrfeed_core::{Error, FeedMetadata};
use scraper::{Html, Selector};

const ISSUES_URL: &str = "https://github.com/pyther/nrfeed/issues";

/// Everything needed to render one feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub author: String,
    pub link: String,
    pub description: String,
    pub image_url: String,
    pub episodes: Vec<Episode>,
}

/// Extract the channel for feed `name` from a fetched program page.
///
/// # Errors
///
/// Returns `Error::RenderFailed` if a `data-play-all` payload is not valid
/// JSON, or if the page has no `<title>` and the registry does not supply
/// both title and author.
pub fn extract_channel(html: &str, name: &str, meta: &FeedMetadata) -> Result<Channel, Error> {
    let document = Html::parse_document(html);

    let mut episodes = Vec::new();
    for element in document.select(&selector("[data-play-all]")) {
        let Some(data) = element.value().attr("data-play-all") else {
            continue;
        };
        let parsed = parse_play_all(data).map_err(|e| Error::RenderFailed(format!("invalid play-all data: {e}")))?;
        episodes.extend(parsed);
    }

    let (page_title, page_author) = page_title(&document);
    let title = meta
        .title
        .clone()
        .or_else(|| page_title.clone())
        .ok_or_else(|| Error::RenderFailed("page has no <title>".into()))?;
    let author = meta
        .author
        .clone()
        .or(page_author)
        .or(page_title)
        .ok_or_else(|| Error::RenderFailed("page has no <title> to derive an author from".into()))?;

    let image_url = meta
        .image
        .clone()
        .or_else(|| find_image(&document, name))
        .unwrap_or_default();

    let description = meta
        .description
        .clone()
        .unwrap_or_else(|| default_description(&meta.url));

    Ok(Channel { title, author, link: meta.url.to_string(), description, image_url, episodes })
}

fn default_description(source: &url::Url) -> String {
    format!("Auto-generated by nrfeed. Data sourced from {source}. Report issues to {ISSUES_URL}")
}

/// Split "Title : Author" from the page `<title>`.
fn page_title(document: &Html) -> (Option<String>, Option<String>) {
    let Some(text) = document
        .select(&selector("title"))
        .next()
        .map(|t| t.text().collect::<String>())
    else {
        return (None, None);
    };

    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }

    match text.split_once(':') {
        Some((title, author)) => (Some(title.trim().to_string()), non_empty(author.trim())),
        None => (Some(text.to_string()), None),
    }
}

fn find_image(document: &Html, name: &str) -> Option<String> {
    let branding = document
        .select(&selector("img.branding__image-title"))
        .find_map(|img| img.value().attr("src"));
    if let Some(src) = branding {
        return Some(src.to_string());
    }

    document
        .select(&selector("img[src]"))
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.contains(name))
        .map(str::to_string)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrfeed_core::FeedRegistry;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Morning Edition : NPR</title></head>
        <body>
            <img class="branding__image-title" src="https://media.npr.org/me-logo.png">
            <div data-play-all='{"audioData": [
                {"uid": "1", "title": "First", "audioUrl": "https://ondemand.npr.org/me/20250120_me_a.mp3?size=100", "storyUrl": "https://www.npr.org/a", "duration": 60},
                {"uid": "2", "title": "Second", "audioUrl": "https://ondemand.npr.org/me/20250120_me_b.mp3?size=200", "storyUrl": "https://www.npr.org/b", "duration": 90}
            ]}'></div>
            <div data-play-all='{"audioData": [
                {"uid": "3", "title": "Third", "audioUrl": "https://ondemand.npr.org/me/20250121_me_c.mp3?size=300", "storyUrl": "https://www.npr.org/c", "duration": 30}
            ]}'></div>
        </body>
        </html>
    "#;

    fn meta(json: &str) -> FeedMetadata {
        FeedRegistry::from_json(json).unwrap().get("morning-edition").unwrap().clone()
    }

    fn plain_meta() -> FeedMetadata {
        meta(r#"{"morning-edition": {"id": 3, "url": "https://www.npr.org/programs/morning-edition/"}}"#)
    }

    #[test]
    fn test_extract_channel() {
        let channel = extract_channel(PAGE, "morning-edition", &plain_meta()).unwrap();

        assert_eq!(channel.title, "Morning Edition");
        assert_eq!(channel.author, "NPR");
        assert_eq!(channel.link, "https://www.npr.org/programs/morning-edition/");
        assert_eq!(channel.image_url, "https://media.npr.org/me-logo.png");
        assert_eq!(
            channel.description,
            "Auto-generated by nrfeed. Data sourced from https://www.npr.org/programs/morning-edition/. \
             Report issues to https://github.com/pyther/nrfeed/issues"
        );

        let uids: Vec<_> = channel.episodes.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_registry_overrides() {
        let meta = meta(
            r#"{"morning-edition": {"id": 3, "url": "https://www.npr.org/programs/morning-edition/",
                "title": "ME", "author": "Public Radio", "description": "Daily news", "image": "https://img/me.png"}}"#,
        );
        let channel = extract_channel(PAGE, "morning-edition", &meta).unwrap();

        assert_eq!(channel.title, "ME");
        assert_eq!(channel.author, "Public Radio");
        assert_eq!(channel.description, "Daily news");
        assert_eq!(channel.image_url, "https://img/me.png");
    }

    #[test]
    fn test_image_found_by_name() {
        let html = r#"<html><head><title>Show : NPR</title></head><body>
            <img src="https://media.npr.org/other.png">
            <img src="https://media.npr.org/morning-edition.png">
        </body></html>"#;
        let channel = extract_channel(html, "morning-edition", &plain_meta()).unwrap();
        assert_eq!(channel.image_url, "https://media.npr.org/morning-edition.png");
        assert!(channel.episodes.is_empty());
    }

    #[test]
    fn test_no_image() {
        let html = "<html><head><title>Show : NPR</title></head><body></body></html>";
        let channel = extract_channel(html, "morning-edition", &plain_meta()).unwrap();
        assert_eq!(channel.image_url, "");
    }

    #[test]
    fn test_title_without_author() {
        let html = "<html><head><title>Just A Show</title></head><body></body></html>";
        let channel = extract_channel(html, "morning-edition", &plain_meta()).unwrap();
        assert_eq!(channel.title, "Just A Show");
        assert_eq!(channel.author, "Just A Show");
    }

    #[test]
    fn test_missing_title_fails() {
        let html = "<html><body><p>nothing</p></body></html>";
        let result = extract_channel(html, "morning-edition", &plain_meta());
        assert!(matches!(result, Err(Error::RenderFailed(_))));
    }

    #[test]
    fn test_missing_title_with_overrides() {
        let meta = meta(
            r#"{"morning-edition": {"id": 3, "url": "https://www.npr.org/programs/morning-edition/",
                "title": "ME", "author": "NPR"}}"#,
        );
        let html = "<html><body></body></html>";
        assert!(extract_channel(html, "morning-edition", &meta).is_ok());
    }

    #[test]
    fn test_malformed_play_all_fails() {
        let html = r#"<html><head><title>Show : NPR</title></head><body>
            <div data-play-all="{broken"></div></body></html>"#;
        let result = extract_channel(html, "morning-edition", &plain_meta());
        assert!(matches!(result, Err(Error::RenderFailed(_))));
    }
}
