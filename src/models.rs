use serde::{Deserialize, Serialize};

/// A catalog entry as returned by the upstream list and detail endpoints.
///
/// `poster_path` and `backdrop_path` are relative image paths; see
/// [`crate::tmdb::poster_url`] for turning them into full URLs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub release_date: String,
    /// Nominally 0..=10 but never validated upstream; render with [`format_rating`].
    pub vote_average: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoviesResponse {
    pub page: i32,
    pub results: Vec<Movie>,
    pub total_pages: i32,
    pub total_results: i32,
}

/// Renders a vote average with one decimal, clamped to 0..=10.
pub fn format_rating(rating: f64) -> String {
    if !rating.is_finite() {
        return "0.0".to_string();
    }
    let safe = rating.clamp(0.0, 10.0);
    format!("{:.1}", (safe * 10.0).round_ties_even() / 10.0)
}

/// Year part of a `YYYY-MM-DD` release date; shorter strings pass through.
pub fn release_year(date: &str) -> &str {
    match date.char_indices().nth(4) {
        Some((idx, _)) => &date[..idx],
        None => date,
    }
}
