use crate::config::Config;
use crate::error::MovieError;
use crate::http::HttpAdapter;
use crate::models::{Movie, MoviesResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w780";

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn popular_movies(&self, page: i32) -> Result<MoviesResponse>;
    async fn search_movies(&self, query: &str, page: i32) -> Result<MoviesResponse>;
    async fn movie_details(&self, id: i32) -> Result<Movie>;
}

#[derive(Clone)]
pub struct TmdbClient {
    http: Arc<dyn HttpAdapter>,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(http: Arc<dyn HttpAdapter>, config: &Config) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<T> {
        params.insert(0, ("api_key", self.api_key.clone()));
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", path);
        let res = self
            .http
            .get(&url, &params)
            .await
            .with_context(|| format!("GET {path} failed"))?;
        if !res.is_success() {
            return Err(MovieError::Status {
                status: res.status,
                path: path.to_string(),
            })
            .with_context(|| format!("GET {path} rejected"));
        }
        serde_json::from_str(&res.body)
            .map_err(|e| MovieError::Decode(e.to_string()))
            .with_context(|| format!("JSON parse failed for {path}"))
    }
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn popular_movies(&self, page: i32) -> Result<MoviesResponse> {
        self.get_json("/movie/popular", vec![("page", page.to_string())])
            .await
    }

    async fn search_movies(&self, query: &str, page: i32) -> Result<MoviesResponse> {
        self.get_json(
            "/search/movie",
            vec![("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn movie_details(&self, id: i32) -> Result<Movie> {
        self.get_json(&format!("/movie/{id}"), Vec::new()).await
    }
}

pub fn poster_url(movie: &Movie) -> Option<String> {
    movie
        .poster_path
        .as_ref()
        .map(|p| format!("{POSTER_BASE}{p}"))
}

/// Wide image for the detail header; falls back to the poster when the
/// catalog has no backdrop.
pub fn backdrop_url(movie: &Movie) -> Option<String> {
    movie
        .backdrop_path
        .as_ref()
        .or(movie.poster_path.as_ref())
        .map(|p| format!("{BACKDROP_BASE}{p}"))
}
