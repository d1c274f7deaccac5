use scraper::{ElementRef, Html, Selector};

/// Containers tried in order when looking for the main article text.
const CONTENT_SELECTORS: &[&str] = &["article", "main", "[role=main]", "body"];

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

const MAX_TAGS: usize = 10;

pub const DEFAULT_EXCERPT_LEN: usize = 200;

/// Keywords used for tagging extracted articles.
const TAG_KEYWORDS: &[&str] = &[
    "wcag",
    "accessibility",
    "a11y",
    "ada",
    "section 508",
    "screen reader",
    "keyboard navigation",
    "aria",
    "semantic html",
    "alt text",
    "contrast",
    "focus",
    "assistive technology",
    "inclusive design",
    "web accessibility",
    "digital accessibility",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedContent {
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn visible_text(root: ElementRef) -> String {
    let mut parts = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(text.to_string());
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Text of the first content container that has any, without scripts and
/// styles. Returns an empty string for documents with no text.
pub fn extract_main_content(html: &str) -> String {
    let document = Html::parse_document(html);
    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// Whitespace-collapsed prefix of `content`, cut at a word boundary when it
/// is longer than `max_len` characters.
pub fn generate_excerpt(content: &str, max_len: usize) -> String {
    let cleaned = collapse_whitespace(content);
    if cleaned.chars().count() <= max_len {
        return cleaned;
    }

    let truncated: String = cleaned.chars().take(max_len).collect();
    match truncated.rfind(' ') {
        Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
        _ => format!("{}...", truncated),
    }
}

pub fn extract_tags(content: &str, title: &str) -> Vec<String> {
    let text = format!("{} {}", title, content).to_lowercase();
    TAG_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .take(MAX_TAGS)
        .map(|keyword| keyword.to_string())
        .collect()
}

pub fn process_article_content(html: &str, title: &str) -> ProcessedContent {
    let content = extract_main_content(html);
    let excerpt = generate_excerpt(&content, DEFAULT_EXCERPT_LEN);
    let tags = extract_tags(&content, title);
    ProcessedContent {
        content,
        excerpt,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_element() {
        let html = r#"
            <html><body>
                <nav>Home | About</nav>
                <article><h1>WCAG 2.2</h1><p>Focus appearance matters.</p></article>
            </body></html>
        "#;
        assert_eq!(extract_main_content(html), "WCAG 2.2 Focus appearance matters.");
    }

    #[test]
    fn test_skips_scripts_and_styles() {
        let html = r#"
            <html><head><style>p { color: red }</style></head><body>
                <script>var tracking = true;</script>
                <p>Alt text   describes
                images.</p>
                <noscript>Enable JS</noscript>
            </body></html>
        "#;
        assert_eq!(extract_main_content(html), "Alt text describes images.");
    }

    #[test]
    fn test_falls_back_when_article_is_empty() {
        let html = "<html><body><article>  </article><main><p>Main text</p></main></body></html>";
        assert_eq!(extract_main_content(html), "Main text");
        assert_eq!(extract_main_content(""), "");
    }

    #[test]
    fn test_generate_excerpt() {
        assert_eq!(generate_excerpt("short   text\n", 200), "short text");
        assert_eq!(generate_excerpt("one two three four", 9), "one two...");
        assert_eq!(generate_excerpt("abcdefghij", 4), "abcd...");
        assert_eq!(generate_excerpt("", 10), "");
    }

    #[test]
    fn test_extract_tags() {
        let tags = extract_tags("A screen reader announces ARIA labels.", "WCAG news");
        assert!(tags.contains(&"wcag".to_string()));
        assert!(tags.contains(&"screen reader".to_string()));
        assert!(tags.contains(&"aria".to_string()));
        assert!(!tags.contains(&"contrast".to_string()));
    }

    #[test]
    fn test_tags_are_capped() {
        let everything = TAG_KEYWORDS.join(" ");
        assert_eq!(extract_tags(&everything, "").len(), MAX_TAGS);
    }
}
