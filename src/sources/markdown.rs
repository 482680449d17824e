use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});

static NOISE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, noscript, nav, header, footer, svg").expect("valid selector")
});

/// Convert the main content of a full HTML page to markdown.
pub fn page_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(|element| element.html())
        .unwrap_or_else(|| html.to_string());

    fragment_to_markdown(&content)
}

/// Convert an HTML fragment (feed content, summary) to markdown.
pub fn fragment_to_markdown(html: &str) -> String {
    let cleaned = strip_noise(html);
    tidy(&html2md::parse_html(&cleaned))
}

/// Extract plain text from HTML content, preserving some structure
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        // Add space after block elements to preserve word boundaries
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" => text.push(' '),
                _ => {}
            }
        }
    }

    // Collapse whitespace and trim
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn strip_noise(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = fragment.root_element().html();

    for element in fragment.select(&NOISE_SELECTOR) {
        out = out.replace(&element.html(), "");
    }
    out
}

// Collapse runs of blank lines left behind by html2md.
fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
