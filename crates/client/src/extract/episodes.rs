//! Episode records from `data-play-all` payloads.
//!
//! Program pages embed a JSON blob per "play all" button:
//!
//! ```json
//! { "audioData": [ { "uid": "…", "title": "…", "audioUrl": "…", "storyUrl": "…", "duration": 312 } ] }
//! ```
//!
//! `audioUrl` is either a plain URL or base64 of one, and carries the file
//! size as a `size` query parameter. The air date is encoded in the file name.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static AIR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/(\d{4})(\d{2})(\d{2}).*\.mp3").expect("invalid air date regex"));

/// One podcast episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub uid: String,
    pub title: String,
    /// Audio file URL without its query string
    pub audio_url: String,
    /// Audio file size in bytes, as reported upstream
    pub audio_size: String,
    pub story_url: String,
    pub duration: String,
    /// RFC 2822 publication date
    pub pub_date: String,
}

#[derive(Debug, Deserialize)]
struct PlayAll {
    #[serde(rename = "audioData", default)]
    audio_data: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    uid: Value,
    #[serde(default)]
    title: String,
    #[serde(rename = "audioUrl", default)]
    audio_url: String,
    #[serde(rename = "storyUrl", default)]
    story_url: String,
    #[serde(default)]
    duration: Value,
}

/// Parse one `data-play-all` attribute value.
///
/// Segments that cannot become an episode are skipped; a value that is not
/// JSON in the expected shape is an error.
pub fn parse_play_all(json: &str) -> Result<Vec<Episode>, serde_json::Error> {
    let play_all: PlayAll = serde_json::from_str(json)?;
    Ok(play_all.audio_data.into_iter().filter_map(episode_from_segment).collect())
}

fn episode_from_segment(segment: Segment) -> Option<Episode> {
    let audio_url = decode_audio_url(&segment.audio_url)?;

    let Some((audio_url, query)) = audio_url.split_once('?') else {
        tracing::debug!(title = %segment.title, "skipping segment without audio query");
        return None;
    };

    let Some(audio_size) = query_param(query, "size") else {
        tracing::debug!(title = %segment.title, "skipping segment without audio size");
        return None;
    };

    let Some(pub_date) = air_date(audio_url) else {
        tracing::debug!(title = %segment.title, %audio_url, "skipping segment without air date");
        return None;
    };

    Some(Episode {
        uid: value_text(&segment.uid),
        title: segment.title,
        audio_url: audio_url.to_string(),
        audio_size: audio_size.to_string(),
        story_url: segment.story_url,
        duration: value_text(&segment.duration),
        pub_date,
    })
}

/// Plain URLs pass through; anything else must be base64 of a UTF-8 URL.
fn decode_audio_url(raw: &str) -> Option<String> {
    if raw.starts_with("http") {
        return Some(raw.to_string());
    }
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Air date of an audio file as an RFC 2822 date at noon Eastern.
fn air_date(audio_url: &str) -> Option<String> {
    let caps = AIR_DATE.captures(audio_url)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(format!("{} 12:00:00 EST", date.format("%a, %d %b %Y")))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUDIO: &str = "https://ondemand.npr.org/anon.npr-mp3/npr/me/2025/01/20250120_me_story.mp3?size=4521984&d=282";

    fn segment_json(audio_url: &str) -> String {
        format!(
            r#"{{"audioData": [{{"uid": "nx-s1-1", "title": "A & B", "audioUrl": "{audio_url}",
                "storyUrl": "https://www.npr.org/2025/01/20/story", "duration": 282}}]}}"#
        )
    }

    #[test]
    fn test_parse_plain_url() {
        let episodes = parse_play_all(&segment_json(AUDIO)).unwrap();
        assert_eq!(episodes.len(), 1);

        let episode = &episodes[0];
        assert_eq!(episode.uid, "nx-s1-1");
        assert_eq!(episode.title, "A & B");
        assert_eq!(
            episode.audio_url,
            "https://ondemand.npr.org/anon.npr-mp3/npr/me/2025/01/20250120_me_story.mp3"
        );
        assert_eq!(episode.audio_size, "4521984");
        assert_eq!(episode.duration, "282");
        assert_eq!(episode.pub_date, "Mon, 20 Jan 2025 12:00:00 EST");
    }

    #[test]
    fn test_parse_base64_url() {
        let encoded = STANDARD.encode(AUDIO);
        let episodes = parse_play_all(&segment_json(&encoded)).unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].audio_size, "4521984");
    }

    #[test]
    fn test_skip_undecodable_url() {
        let episodes = parse_play_all(&segment_json("not base64 at all!")).unwrap();
        assert!(episodes.is_empty());
    }

    #[test]
    fn test_skip_missing_size() {
        let url = "https://ondemand.npr.org/npr/me/2025/01/20250120_me_story.mp3?d=282";
        assert!(parse_play_all(&segment_json(url)).unwrap().is_empty());
    }

    #[test]
    fn test_skip_missing_query() {
        let url = "https://ondemand.npr.org/npr/me/2025/01/20250120_me_story.mp3";
        assert!(parse_play_all(&segment_json(url)).unwrap().is_empty());
    }

    #[test]
    fn test_skip_missing_date() {
        let url = "https://ondemand.npr.org/npr/me/story.mp3?size=10";
        assert!(parse_play_all(&segment_json(url)).unwrap().is_empty());
    }

    #[test]
    fn test_skip_impossible_date() {
        let url = "https://ondemand.npr.org/npr/me/2025/13/20251340_me.mp3?size=10";
        assert!(parse_play_all(&segment_json(url)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_play_all("{audioData").is_err());
    }

    #[test]
    fn test_missing_audio_data_is_empty() {
        assert!(parse_play_all("{}").unwrap().is_empty());
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("size=1&d=2", "d"), Some("2"));
        assert_eq!(query_param("size=1&d=2", "x"), None);
        assert_eq!(query_param("flag&size=3", "size"), Some("3"));
    }
}
