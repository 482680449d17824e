//! Caption text extraction for YouTube's WebVTT and JSON3 subtitle formats.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPEAKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z\s]+\d+:\d+:\d+").expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Detect the format and return whitespace-normalized caption text.
pub fn parse_transcript(content: &str) -> String {
    let content = content.trim();

    if content.starts_with('{') {
        if let Some(text) = parse_json3(content) {
            return text;
        }
    }

    parse_vtt(content)
}

fn parse_json3(content: &str) -> Option<String> {
    let data: Json3 = serde_json::from_str(content).ok()?;

    let text: String = data
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.as_str())
        .filter(|t| !t.is_empty() && *t != "\n")
        .collect();

    Some(normalize_whitespace(&text))
}

fn parse_vtt(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_block = false;
    let mut block_start = true;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            in_block = false;
            block_start = true;
            continue;
        }
        // Header, NOTE, STYLE and REGION blocks run to the next blank line.
        let opens_block = block_start && starts_block(line);
        block_start = false;
        if in_block || opens_block {
            in_block = true;
            continue;
        }
        if line.contains("-->") || is_metadata(line) {
            continue;
        }
        // Cue identifiers
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let line = TAG_RE.replace_all(line, "");
        let line = SPEAKER_RE.replace(&line, "");
        let line = line.trim();

        // Auto-generated captions repeat the previous cue's line.
        if line.is_empty() || lines.last().map(|l| l == line).unwrap_or(false) {
            continue;
        }
        lines.push(line.to_string());
    }

    normalize_whitespace(&lines.join(" "))
}

fn starts_block(line: &str) -> bool {
    ["WEBVTT", "NOTE", "STYLE", "REGION"].iter().any(|keyword| {
        line.strip_prefix(keyword)
            .map(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .unwrap_or(false)
    })
}

fn is_metadata(line: &str) -> bool {
    ["Kind:", "Language:"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}
