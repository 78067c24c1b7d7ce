//! RSS 2.0 podcast document writer.

use std::fmt::Write;

use crate::extract::{Channel, Episode};

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// Write `channel` as an RSS 2.0 document with iTunes tags.
pub fn write_rss(channel: &Channel) -> String {
    let mut out = String::with_capacity(1024 + channel.episodes.len() * 512);

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<rss version=\"2.0\" xmlns:itunes=\"{ITUNES_NS}\">");
    out.push_str("<channel>\n");

    element(&mut out, 1, "title", &channel.title);
    element(&mut out, 1, "link", &channel.link);
    element(&mut out, 1, "description", &channel.description);
    element(&mut out, 1, "language", "en-us");
    element(&mut out, 1, "itunes:author", &channel.author);
    element(&mut out, 1, "itunes:summary", &channel.description);

    if !channel.image_url.is_empty() {
        let _ = writeln!(out, "  <itunes:image href=\"{}\"/>", escape(&channel.image_url));
        out.push_str("  <image>\n");
        element(&mut out, 2, "url", &channel.image_url);
        element(&mut out, 2, "title", &channel.title);
        element(&mut out, 2, "link", &channel.link);
        out.push_str("  </image>\n");
    }

    for episode in &channel.episodes {
        write_item(&mut out, episode, &channel.author);
    }

    out.push_str("</channel>\n</rss>\n");
    out
}

fn write_item(out: &mut String, episode: &Episode, author: &str) {
    out.push_str("  <item>\n");
    element(out, 2, "title", &episode.title);
    element(out, 2, "link", &episode.story_url);
    element(out, 2, "guid", &episode.uid);
    element(out, 2, "pubDate", &episode.pub_date);
    element(out, 2, "itunes:author", author);
    element(out, 2, "itunes:duration", &episode.duration);
    let _ = writeln!(
        out,
        "    <enclosure url=\"{}\" length=\"{}\" type=\"audio/mpeg\"/>",
        escape(&episode.audio_url),
        escape(&episode.audio_size)
    );
    out.push_str("  </item>\n");
}

fn element(out: &mut String, depth: usize, tag: &str, text: &str) {
    let _ = writeln!(out, "{:indent$}<{tag}>{}</{tag}>", "", escape(text), indent = depth * 2);
}

/// Escape text for use in XML character data and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
