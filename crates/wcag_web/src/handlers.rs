use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use wcag_core::{Error, QuizScore, Revalidator};
use wcag_scrapers::PipelineOutcome;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const SERVICE_NAME: &str = "TheWCAG.com";
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<String>,
}

pub async fn get_scores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoresQuery>,
) -> ApiResult<Json<Value>> {
    let kind = query.kind.unwrap_or_else(|| "all-time".to_string());
    let limit = query
        .limit
        .and_then(|l| l.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let failed = |e: Error| {
        ApiError::new(e, "Failed to retrieve leaderboard").with_details(state.config.environment)
    };

    if kind == "stats" {
        let stats = state.scores.leaderboard_stats().await.map_err(failed)?;
        return Ok(Json(json!({ "success": true, "data": stats })));
    }

    let leaderboard: Vec<QuizScore> = if kind == "daily" {
        state.scores.daily_leaderboard(limit).await
    } else {
        state.scores.all_time_leaderboard(limit).await
    }
    .map_err(failed)?;

    Ok(Json(json!({
        "success": true,
        "data": leaderboard,
        "type": kind,
        "limit": limit,
    })))
}

/// Accepts JSON integers and floats without a fractional part.
fn whole_number(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|_| ApiError::validation("Invalid request body"))
}

pub async fn post_score(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;

    let (Some(score), Some(total)) = (whole_number(body.get("score")), whole_number(body.get("total")))
    else {
        return Err(ApiError::validation("Invalid score or total"));
    };

    let name = match body.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        Some(_) => return Err(ApiError::validation("Name must be a string")),
    };

    let saved = state
        .scores
        .save_score(score, total, name)
        .await
        .map_err(|e| ApiError::new(e, "Failed to save score").with_details(state.config.environment))?;

    Ok(Json(json!({ "success": true, "data": saved })))
}

pub async fn revalidate(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<Value>> {
    let Some(expected) = state.config.revalidate_secret.as_deref() else {
        return Err(ApiError::new(
            Error::Config("REVALIDATE_SECRET is not configured".to_string()),
            "Revalidation not configured",
        ));
    };

    let body = parse_body(&body)?;
    if body.get("secret").and_then(Value::as_str) != Some(expected) {
        tracing::warn!("Invalid revalidation secret");
        return Err(Error::Unauthorized("Invalid secret".to_string()).into());
    }

    let path = match body.get("path").and_then(Value::as_str) {
        Some(path) if !path.trim().is_empty() => path.to_string(),
        _ => return Err(ApiError::validation("Path is required")),
    };

    state
        .cache
        .revalidate(&path)
        .await
        .map_err(|e| ApiError::new(e, "Revalidation failed").with_details(state.config.environment))?;

    Ok(Json(json!({
        "revalidated": true,
        "path": path,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// `Authorization: Bearer <secret>` or `x-cron-secret: <secret>`.
fn cron_authorized(headers: &HeaderMap, secret: &str) -> bool {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let direct = headers.get("x-cron-secret").and_then(|v| v.to_str().ok());
    bearer == Some(secret) || direct == Some(secret)
}

pub async fn cron_generate_blog(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    if let Some(secret) = state.config.cron_secret.as_deref() {
        if !cron_authorized(&headers, secret) {
            tracing::warn!("Invalid cron secret");
            return Err(Error::Unauthorized("Unauthorized".to_string()).into());
        }
    }

    let outcome = state.pipeline.run().await.map_err(|e| {
        ApiError::new(e, "Blog generation failed").with_details(state.config.environment)
    })?;

    let body = match outcome {
        PipelineOutcome::NoArticles => json!({
            "success": true,
            "message": "No articles found",
            "articlesCount": 0,
            "blogPostCreated": false,
        }),
        PipelineOutcome::Created {
            post,
            articles_count,
        } => json!({
            "success": true,
            "message": "Blog post generated successfully",
            "blogPost": {
                "slug": post.slug,
                "title": post.title,
                "isPublished": post.is_published,
                "factCheckStatus": post.fact_check_status,
            },
            "articlesCount": articles_count,
            "blogPostCreated": true,
        }),
    };
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct TestBlogQuery {
    #[serde(rename = "test-only")]
    test_only: Option<String>,
}

pub async fn test_blog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TestBlogQuery>,
) -> ApiResult<Json<Value>> {
    let environment = state.config.environment;
    if environment.is_production() {
        return Err(Error::Forbidden("Not available in production".to_string()).into());
    }
    let extraction_only = query.test_only.as_deref() == Some("true");

    let env_check = state.config.pipeline_env_check();
    let mut results = Map::new();
    results.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
    results.insert("environment".into(), json!(environment.as_str()));
    results.insert(
        "envCheck".into(),
        Value::Object(
            env_check
                .iter()
                .map(|check| (check.key.to_string(), Value::Bool(check.set)))
                .collect(),
        ),
    );

    let missing: Vec<&str> = env_check
        .iter()
        .filter(|check| check.is_missing())
        .map(|check| check.key)
        .collect();
    if !missing.is_empty() {
        results.insert("error".into(), json!("Missing environment variables"));
        results.insert("missing".into(), json!(missing));
        return Ok(Json(Value::Object(results)));
    }

    let report = state
        .pipeline
        .dry_run(extraction_only)
        .await
        .map_err(|e| ApiError::new(e, "Test failed").with_details(environment))?;

    let completed = report.fact_check.is_some();
    if let Value::Object(report) = serde_json::to_value(&report).map_err(Error::from)? {
        results.extend(report);
    }
    if completed {
        results.insert("success".into(), Value::Bool(true));
    }
    Ok(Json(Value::Object(results)))
}

pub async fn list_posts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    const PATH: &str = "/blog";
    if let Some(cached) = state.cache.get(PATH).await {
        return Ok(Json(cached));
    }
    let generation = state.cache.generation(PATH).await;

    let posts = state.posts.get_published().await.map_err(|e| {
        ApiError::new(e, "Failed to load blog posts").with_details(state.config.environment)
    })?;
    let body = json!({ "success": true, "data": posts });
    state.cache.insert_if_fresh(PATH, generation, body.clone()).await;
    Ok(Json(body))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let path = format!("/blog/{}", slug);
    if let Some(cached) = state.cache.get(&path).await {
        return Ok(Json(cached));
    }
    let generation = state.cache.generation(&path).await;

    let post = state
        .posts
        .get_by_slug(&slug)
        .await
        .map_err(|e| {
            ApiError::new(e, "Failed to load blog post").with_details(state.config.environment)
        })?
        .filter(|post| post.is_published)
        .ok_or_else(|| Error::NotFound("Blog post not found".to_string()))?;

    let body = json!({ "success": true, "data": post });
    state.cache.insert_if_fresh(&path, generation, body.clone()).await;
    Ok(Json(body))
}
