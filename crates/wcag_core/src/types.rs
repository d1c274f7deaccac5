use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MAX_NAME_LEN: usize = 50;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref SLUG_INVALID: Regex = Regex::new(r"[^A-Za-z0-9_\s-]").unwrap();
    static ref SLUG_SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
}

/// A news item pulled from an external source. Lives for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    pub content: String,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub source: String,
}

impl From<&Article> for SourceRef {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    Verified,
    NeedsReview,
}

impl FactCheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCheckStatus::Verified => "verified",
            FactCheckStatus::NeedsReview => "needs_review",
        }
    }
}

impl std::str::FromStr for FactCheckStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "verified" => Ok(FactCheckStatus::Verified),
            "needs_review" => Ok(FactCheckStatus::NeedsReview),
            other => Err(Error::Storage(format!("Unknown fact-check status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactCheckResult {
    pub verified: bool,
    pub notes: String,
}

impl FactCheckResult {
    pub fn status(&self) -> FactCheckStatus {
        if self.verified {
            FactCheckStatus::Verified
        } else {
            FactCheckStatus::NeedsReview
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceRef>,
    pub fact_check_status: FactCheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_check_notes: Option<String>,
    pub is_published: bool,
    pub tags: Vec<String>,
}

impl BlogPost {
    pub fn metadata(&self) -> BlogPostMetadata {
        BlogPostMetadata {
            slug: self.slug.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            published_at: self.published_at,
            fact_check_status: self.fact_check_status,
            is_published: self.is_published,
        }
    }
}

/// List-view projection of a [`BlogPost`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostMetadata {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub fact_check_status: FactCheckStatus,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizScore {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

impl QuizScore {
    /// Validates the range and sanitizes the display name. Nothing is
    /// persisted here; backends store the returned value as-is.
    pub fn new(score: i64, total: i64, name: Option<&str>) -> Result<Self> {
        if total <= 0 || score < 0 || score > total {
            return Err(Error::Validation(
                "Score must be between 0 and total".to_string(),
            ));
        }
        let total = u32::try_from(total)
            .map_err(|_| Error::Validation("Total is too large".to_string()))?;
        let score = score as u32;

        let timestamp = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.and_then(sanitize_name),
            score,
            total,
            percentage: percentage(score, total),
            timestamp,
            date: timestamp.date_naive(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    pub total_attempts: usize,
    pub today_attempts: usize,
    pub average_score: u32,
}

impl LeaderboardStats {
    pub fn from_scores(scores: &[QuizScore], today: NaiveDate) -> Self {
        let total_attempts = scores.len();
        let today_attempts = scores.iter().filter(|s| s.date == today).count();
        let average_score = if scores.is_empty() {
            0
        } else {
            let sum: u64 = scores.iter().map(|s| s.percentage as u64).sum();
            (sum as f64 / scores.len() as f64).round() as u32
        };
        Self {
            total_attempts,
            today_attempts,
            average_score,
        }
    }
}

pub fn percentage(score: u32, total: u32) -> u32 {
    ((score as f64 / total as f64) * 100.0).round() as u32
}

/// Orders scores best-first. The sort is stable, so equal percentages keep
/// their insertion order.
pub fn rank_scores(mut scores: Vec<QuizScore>, limit: usize) -> Vec<QuizScore> {
    scores.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    scores.truncate(limit);
    scores
}

/// Strips markup and caps the length. Returns `None` when nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let stripped = HTML_TAG.replace_all(raw, "");
    let name: String = stripped.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// URL-friendly slug: lowercase, punctuation dropped, separators collapsed
/// into single hyphens.
pub fn generate_slug(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    let cleaned = SLUG_INVALID.replace_all(&lower, "");
    let joined = SLUG_SEPARATORS.replace_all(&cleaned, "-");
    joined.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Accessibility News Roundup"), "accessibility-news-roundup");
        assert_eq!(generate_slug("  WCAG 2.2: What's New?  "), "wcag-22-whats-new");
        assert_eq!(generate_slug("--under_score -- spaces--"), "under-score-spaces");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_sanitize_name_strips_markup() {
        assert_eq!(sanitize_name("<b>Alice</b>"), Some("Alice".to_string()));
        assert_eq!(sanitize_name("  <script>x</script>  "), Some("x".to_string()));
        assert_eq!(sanitize_name("<br/>"), None);
        assert_eq!(sanitize_name("   "), None);
    }

    #[test]
    fn test_sanitize_name_truncates() {
        let long = "a".repeat(80);
        let name = sanitize_name(&long).unwrap();
        assert_eq!(name.chars().count(), MAX_NAME_LEN);

        let wide = "é".repeat(60);
        assert_eq!(sanitize_name(&wide).unwrap().chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_quiz_score_validation() {
        assert!(matches!(QuizScore::new(11, 10, None), Err(Error::Validation(_))));
        assert!(matches!(QuizScore::new(0, 0, None), Err(Error::Validation(_))));
        assert!(matches!(QuizScore::new(-1, 10, None), Err(Error::Validation(_))));

        let score = QuizScore::new(7, 10, Some("<i>Bob</i>")).unwrap();
        assert_eq!(score.percentage, 70);
        assert_eq!(score.name.as_deref(), Some("Bob"));
        assert_eq!(score.date, score.timestamp.date_naive());

        let perfect = QuizScore::new(10, 10, None).unwrap();
        assert_eq!(perfect.percentage, 100);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 30), 0);
    }

    #[test]
    fn test_rank_scores_keeps_insertion_order_on_ties() {
        let a = QuizScore::new(5, 10, Some("first")).unwrap();
        let b = QuizScore::new(9, 10, Some("best")).unwrap();
        let c = QuizScore::new(5, 10, Some("second")).unwrap();
        let ranked = rank_scores(vec![a, b, c], 10);
        let names: Vec<_> = ranked.iter().map(|s| s.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["best", "first", "second"]);
    }

    #[test]
    fn test_stats() {
        let scores = vec![
            QuizScore::new(3, 10, None).unwrap(),
            QuizScore::new(9, 10, None).unwrap(),
        ];
        let today = Utc::now().date_naive();
        let stats = LeaderboardStats::from_scores(&scores, today);
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.today_attempts, 2);
        assert_eq!(stats.average_score, 60);

        let empty = LeaderboardStats::from_scores(&[], today);
        assert_eq!(empty.average_score, 0);
    }

    #[test]
    fn test_blog_post_json_shape() {
        let post = BlogPost {
            slug: "roundup".into(),
            title: "Roundup".into(),
            content: "Body".into(),
            excerpt: "Body...".into(),
            published_at: Utc::now(),
            generated_at: Utc::now(),
            sources: vec![],
            fact_check_status: FactCheckStatus::NeedsReview,
            fact_check_notes: None,
            is_published: false,
            tags: vec!["wcag".into()],
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["factCheckStatus"], "needs_review");
        assert_eq!(json["isPublished"], false);
        assert!(json.get("factCheckNotes").is_none());
    }
}
