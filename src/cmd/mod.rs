pub mod budget;
pub mod check;
pub mod footage;
pub mod probe;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use storyreel::{strip_links, TextSegment};

/// One entry of a passages file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PassageEntry {
    Text(String),
    Full {
        text: String,
        #[serde(default)]
        author: Option<String>,
    },
}

/// Parse a JSON passages file into ordered segments.
///
/// Entries that are empty after link stripping are dropped; indices stay
/// contiguous.
pub fn parse_passages(json: &str, keep_links: bool) -> Result<Vec<TextSegment>> {
    let entries: Vec<PassageEntry> = serde_json::from_str(json)?;

    let segments = entries
        .into_iter()
        .map(|entry| match entry {
            PassageEntry::Text(text) => (text, None),
            PassageEntry::Full { text, author } => (text, author),
        })
        .map(|(text, author)| {
            let text = if keep_links {
                text.trim().to_string()
            } else {
                strip_links(&text)
            };
            (text, author)
        })
        .filter(|(text, _)| !text.is_empty())
        .enumerate()
        .map(|(i, (text, author))| {
            let segment = TextSegment::new(i, text);
            match author {
                Some(author) => segment.with_author(author),
                None => segment,
            }
        })
        .collect();

    Ok(segments)
}

pub fn load_passages(path: &Path, keep_links: bool) -> Result<Vec<TextSegment>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_passages(&json, keep_links).with_context(|| format!("invalid passages in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strings_and_objects() {
        let json = r#"[
            "What is the best advice you ever got?",
            {"text": "Measure twice, cut once.", "author": "carpenter42"},
            {"text": "Sleep on it."}
        ]"#;
        let segments = parse_passages(json, false).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].author.as_deref(), Some("carpenter42"));
        assert_eq!(segments[2].index, 2);
        assert!(segments[2].author.is_none());
    }

    #[test]
    fn links_stripped_unless_kept() {
        let json = r#"["see https://example.com/a for more", "https://example.com/only", "ok"]"#;

        let stripped = parse_passages(json, false).unwrap();
        assert_eq!(stripped.len(), 2);
        assert_eq!(stripped[0].text, "see for more");
        assert_eq!(stripped[1].index, 1);
        assert_eq!(stripped[1].text, "ok");

        let kept = parse_passages(json, true).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept[0].text.contains("https://"));
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_passages(r#"{"text": "x"}"#, false).is_err());
    }
}
