//! PubMed query construction.
//!
//! The strict query ORs the placeholder hint with a title/goal clause and
//! restricts hits to high-quality study designs in humans. The relaxed
//! fallback drops the study-design restriction only.

use chrono::{Datelike, Utc};

/// Preferred study designs, strongest evidence first.
pub const PUBLICATION_TYPE_FILTER: &str = concat!(
    r#"("practice guideline"[Publication Type] OR "guideline"[Publication Type] OR "#,
    r#""systematic review"[Publication Type] OR "meta-analysis"[Publication Type] OR "#,
    r#""randomized controlled trial"[Publication Type])"#,
);

pub const HUMANS_FILTER: &str = r#"("humans"[MeSH Terms])"#;

/// Oldest year a date window may start at.
pub const EARLIEST_YEAR: i32 = 1900;

/// Open upper bound of the publication-date window.
const LATEST_YEAR: &str = "3000";

/// Strict query for the current UTC year.
pub fn build_query(title: &str, goal: &str, raw_hint: &str, recency_years: u32) -> String {
    build_query_for_year(title, goal, raw_hint, recency_years, current_year())
}

pub fn build_query_for_year(
    title: &str,
    goal: &str,
    raw_hint: &str,
    recency_years: u32,
    current_year: i32,
) -> String {
    compose(
        title,
        goal,
        raw_hint,
        &[PUBLICATION_TYPE_FILTER, HUMANS_FILTER],
        recency_years,
        current_year,
    )
}

pub fn build_relaxed_query_for_year(
    title: &str,
    goal: &str,
    raw_hint: &str,
    recency_years: u32,
    current_year: i32,
) -> String {
    compose(title, goal, raw_hint, &[HUMANS_FILTER], recency_years, current_year)
}

/// `("<from>"[dp] : "3000"[dp])`, or `None` when the window is disabled.
pub fn date_filter(recency_years: u32, current_year: i32) -> Option<String> {
    if recency_years == 0 {
        return None;
    }
    let from_year = current_year
        .saturating_sub(i32::try_from(recency_years).unwrap_or(i32::MAX))
        .max(EARLIEST_YEAR);
    Some(format!(r#"("{}"[dp] : "{}"[dp])"#, from_year, LATEST_YEAR))
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

fn compose(
    title: &str,
    goal: &str,
    raw_hint: &str,
    filters: &[&str],
    recency_years: u32,
    current_year: i32,
) -> String {
    let base = format!("({}) OR ({} {})", raw_hint.trim(), title, goal);
    let mut query = format!("({})", base);
    for filter in filters {
        query.push_str(" AND ");
        query.push_str(filter);
    }
    if let Some(dates) = date_filter(recency_years, current_year) {
        query.push_str(" AND ");
        query.push_str(&dates);
    }
    query
}
