use wcag_core::Article;

/// Per-article content cap inside the generation prompt.
pub const MAX_ARTICLE_CHARS: usize = 2000;

pub const WRITER_SYSTEM_PROMPT: &str = "You are an expert accessibility content writer who creates \
well-structured, informative blog posts about web accessibility and WCAG compliance.";

pub const FACT_CHECKER_SYSTEM_PROMPT: &str = "You are a fact-checker for accessibility content. \
You verify the accuracy of WCAG guidelines, accessibility standards, legal information, and \
technical details. Always respond with valid JSON only.";

fn clip(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

pub fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            format!(
                "Article {}:\nTitle: {}\nSource: {}\nURL: {}\nPublished: {}\nContent: {}",
                i + 1,
                article.title,
                article.source,
                article.url,
                article.published_date.to_rfc3339(),
                clip(&article.content, MAX_ARTICLE_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn generation_prompt(articles: &[Article]) -> String {
    format!(
        r#"You are a professional accessibility content writer. Create a comprehensive, well-structured blog post that consolidates and synthesizes the following accessibility articles from the last 48 hours.

Articles:
{}

Requirements:
1. Create a single, cohesive blog post (not a list of articles)
2. Synthesize information from all articles into a unified narrative
3. Use proper markdown formatting with headings, paragraphs, and lists
4. Include a "Sources" section at the end with all article titles, sources, and URLs
5. Write in a professional, engaging tone suitable for accessibility professionals
6. Focus on key insights, trends, and important information
7. Ensure the content is accurate and well-organized
8. The blog post should be substantial (at least 800 words)
9. Use H2 headings for main sections
10. Include an introduction and conclusion

Format the response as clean markdown. Do not include a title in the markdown (we'll add that separately)."#,
        format_articles(articles)
    )
}

pub fn fact_check_prompt(content: &str, title: &str) -> String {
    format!(
        r#"You are a fact-checker specializing in web accessibility and WCAG compliance. Review the following blog post for factual accuracy.

Title: {}

Content:
{}

Please check for:
1. Accuracy of WCAG compliance claims and guidelines
2. Correctness of dates, statistics, and technical information
3. Verification of accessibility standards and best practices
4. Any misleading or incorrect statements about accessibility
5. Accuracy of legal information (ADA, Section 508, etc.)
6. Technical accuracy of implementation details

Respond with a JSON object in this exact format:
{{
  "verified": true or false,
  "notes": "Detailed explanation of any issues found, or 'All facts verified' if everything is correct"
}}

If the content is factually correct, set "verified" to true. If there are any factual errors, inaccuracies, or unverified claims, set "verified" to false and provide detailed notes.

Return ONLY the JSON object, no other text."#,
        title, content
    )
}
