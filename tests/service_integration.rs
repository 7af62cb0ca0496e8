//! Service-level tests for shortening, click recording and analytics
//!
//! These run against in-memory SQLite and drive `UrlService` directly with
//! explicit click times so date bucketing is deterministic.

use chrono::{NaiveDate, NaiveDateTime};
use tinytrail::service::{ServiceError, UrlService, MAX_CODE_ATTEMPTS};
use tinytrail::shortcode::{ALPHABET, SHORT_CODE_LENGTH};
use tinytrail::storage::{SqliteStorage, Storage};
use std::sync::Arc;

async fn create_test_service() -> UrlService {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    UrlService::new(Arc::new(storage))
}

fn dt(s: &str) -> NaiveDateTime {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_shorten_generates_alphanumeric_code() {
    let service = create_test_service().await;

    let mapping = service
        .create_short_url("https://example.com/articles/42", "alice")
        .await
        .unwrap();

    assert_eq!(mapping.short_url.len(), SHORT_CODE_LENGTH);
    assert!(mapping.short_url.chars().all(|c| ALPHABET.contains(c)));
    assert_eq!(mapping.owner, "alice");
    assert_eq!(mapping.click_count, 0);
}

#[tokio::test]
async fn test_shorten_rejects_invalid_urls() {
    let service = create_test_service().await;

    for bad in [
        "",
        "   ",
        "example.com",
        "javascript:alert(1)",
        "data:text/html,hi",
        "https://",
        "https://exa mple.com/",
    ] {
        let result = service.create_short_url(bad, "alice").await;
        assert!(
            matches!(result, Err(ServiceError::InvalidUrl(_))),
            "'{bad}' should be rejected"
        );
    }
}

#[tokio::test]
async fn test_shorten_retries_taken_codes() {
    let service = create_test_service().await;

    service
        .create_short_url_with("https://first.example.com", "alice", || "taken123".to_string())
        .await
        .unwrap();

    // Popped from the back: the taken code comes first, then a free one
    let mut codes = vec!["fresh456", "taken123"];
    let mapping = service
        .create_short_url_with("https://second.example.com", "bob", move || {
            codes.pop().unwrap_or("spare789").to_string()
        })
        .await
        .unwrap();

    assert_eq!(mapping.short_url, "fresh456");
    assert_eq!(mapping.owner, "bob");
}

#[tokio::test]
async fn test_shorten_gives_up_when_codes_keep_colliding() {
    let service = create_test_service().await;

    service
        .create_short_url_with("https://first.example.com", "alice", || "taken123".to_string())
        .await
        .unwrap();

    let mut calls = 0;
    let result = service
        .create_short_url_with("https://second.example.com", "alice", || {
            calls += 1;
            "taken123".to_string()
        })
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::CodeSpaceExhausted(n)) if n == MAX_CODE_ATTEMPTS
    ));
    assert_eq!(calls, MAX_CODE_ATTEMPTS);
}

#[tokio::test]
async fn test_resolve_counts_every_click() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();

    let resolved = service.resolve(&mapping.short_url).await.unwrap().unwrap();
    assert_eq!(resolved.click_count, 1);
    assert_eq!(resolved.original_url, "https://example.com/");

    for _ in 0..9 {
        service.resolve(&mapping.short_url).await.unwrap();
    }

    let stored = service.storage().get(&mapping.short_url).await.unwrap().unwrap();
    let events = service.storage().click_events(mapping.id).await.unwrap();
    assert_eq!(stored.click_count, 10);
    assert_eq!(events.len(), 10);
}

#[tokio::test]
async fn test_resolve_unknown_code_is_none() {
    let service = create_test_service().await;
    assert!(service.resolve("unknown1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_click_counts_by_date_for_one_code() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();
    let code = mapping.short_url.as_str();

    service.resolve_at(code, dt("2024-06-01T08:00:00")).await.unwrap();
    service.resolve_at(code, dt("2024-06-01T13:00:00")).await.unwrap();
    service.resolve_at(code, dt("2024-06-01T22:00:00")).await.unwrap();
    service.resolve_at(code, dt("2024-06-03T09:00:00")).await.unwrap();

    let series = service
        .click_counts_by_date(code, dt("2024-06-01T00:00:00"), dt("2024-06-02T23:59:59"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].click_date, dt("2024-06-01T00:00:00"));
    assert_eq!(series[0].count, 3);

    // Both ends of the range are inclusive
    let edge = service
        .click_counts_by_date(code, dt("2024-06-01T13:00:00"), dt("2024-06-03T09:00:00"))
        .await
        .unwrap()
        .unwrap();
    let total: i64 = edge.iter().map(|c| c.count).sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_click_counts_distinguish_unknown_from_empty() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();

    let unknown = service
        .click_counts_by_date("unknown1", dt("2024-01-01T00:00:00"), dt("2024-12-31T23:59:59"))
        .await
        .unwrap();
    assert!(unknown.is_none());

    let empty = service
        .click_counts_by_date(
            &mapping.short_url,
            dt("2024-01-01T00:00:00"),
            dt("2024-12-31T23:59:59"),
        )
        .await
        .unwrap();
    assert_eq!(empty, Some(vec![]));
}

#[tokio::test]
async fn test_total_clicks_across_owned_codes() {
    let service = create_test_service().await;
    let a = service.create_short_url("https://a.example.com", "alice").await.unwrap();
    let b = service.create_short_url("https://b.example.com", "alice").await.unwrap();
    let other = service.create_short_url("https://c.example.com", "bob").await.unwrap();

    service.resolve_at(&a.short_url, dt("2024-07-04T10:00:00")).await.unwrap();
    service.resolve_at(&a.short_url, dt("2024-07-04T11:00:00")).await.unwrap();
    service.resolve_at(&b.short_url, dt("2024-07-04T12:00:00")).await.unwrap();
    service.resolve_at(&other.short_url, dt("2024-07-04T12:00:00")).await.unwrap();

    let totals = service
        .total_clicks("alice", date("2024-07-04"), date("2024-07-04"))
        .await
        .unwrap();

    assert_eq!(totals.len(), 1);
    assert_eq!(totals[&date("2024-07-04")], 3);
}

#[tokio::test]
async fn test_total_clicks_end_date_is_inclusive_by_day() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();
    let code = mapping.short_url.as_str();

    service.resolve_at(code, dt("2024-08-09T23:59:59")).await.unwrap();
    service.resolve_at(code, dt("2024-08-10T00:00:00")).await.unwrap();
    service.resolve_at(code, dt("2024-08-10T23:59:59")).await.unwrap();
    service.resolve_at(code, dt("2024-08-11T00:00:00")).await.unwrap();

    let totals = service
        .total_clicks("alice", date("2024-08-10"), date("2024-08-10"))
        .await
        .unwrap();

    assert_eq!(totals.len(), 1, "neighbouring days must not leak in");
    assert_eq!(totals[&date("2024-08-10")], 2);
}

#[tokio::test]
async fn test_total_clicks_omit_days_without_clicks() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();

    service.resolve_at(&mapping.short_url, dt("2024-09-01T10:00:00")).await.unwrap();
    service.resolve_at(&mapping.short_url, dt("2024-09-05T10:00:00")).await.unwrap();

    let totals = service
        .total_clicks("alice", date("2024-09-01"), date("2024-09-07"))
        .await
        .unwrap();

    let days: Vec<String> = totals.keys().map(|d| d.to_string()).collect();
    assert_eq!(days, vec!["2024-09-01", "2024-09-05"]);

    let reversed = service
        .total_clicks("alice", date("2024-09-07"), date("2024-09-01"))
        .await
        .unwrap();
    assert!(reversed.is_empty());
}

#[tokio::test]
async fn test_analytics_queries_are_repeatable() {
    let service = create_test_service().await;
    let mapping = service
        .create_short_url("https://example.com", "alice")
        .await
        .unwrap();

    for hour in 0..5 {
        let at = dt("2024-10-01T00:00:00") + chrono::Duration::hours(hour * 7);
        service.resolve_at(&mapping.short_url, at).await.unwrap();
    }

    let start = dt("2024-10-01T00:00:00");
    let end = dt("2024-10-03T00:00:00");
    let first = service
        .click_counts_by_date(&mapping.short_url, start, end)
        .await
        .unwrap();
    let second = service
        .click_counts_by_date(&mapping.short_url, start, end)
        .await
        .unwrap();
    assert_eq!(first, second);

    let totals_first = service
        .total_clicks("alice", date("2024-10-01"), date("2024-10-02"))
        .await
        .unwrap();
    let totals_second = service
        .total_clicks("alice", date("2024-10-01"), date("2024-10-02"))
        .await
        .unwrap();
    assert_eq!(totals_first, totals_second);
    assert_eq!(totals_first.values().sum::<i64>(), 5);
}
