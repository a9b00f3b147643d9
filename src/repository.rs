use crate::error::MovieError;
use crate::models::{Movie, MoviesResponse};
use crate::tmdb::MovieApi;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn popular_movies(&self, page: i32) -> Result<MoviesResponse, MovieError>;
    async fn search_movies(&self, query: &str, page: i32) -> Result<MoviesResponse, MovieError>;
    async fn movie_details(&self, id: i32) -> Result<Movie, MovieError>;
}

/// Boundary between the API client's `anyhow` chains and the typed errors
/// the rest of the crate works with.
#[derive(Clone)]
pub struct TmdbMovieRepository {
    api: Arc<dyn MovieApi>,
}

impl TmdbMovieRepository {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        Self { api }
    }
}

fn settle<T>(result: anyhow::Result<T>) -> Result<T, MovieError> {
    result.map_err(|e| {
        debug!("upstream call failed: {:#}", e);
        MovieError::from_anyhow(e)
    })
}

#[async_trait]
impl MovieRepository for TmdbMovieRepository {
    async fn popular_movies(&self, page: i32) -> Result<MoviesResponse, MovieError> {
        settle(self.api.popular_movies(page).await)
    }

    async fn search_movies(&self, query: &str, page: i32) -> Result<MoviesResponse, MovieError> {
        settle(self.api.search_movies(query, page).await)
    }

    async fn movie_details(&self, id: i32) -> Result<Movie, MovieError> {
        settle(self.api.movie_details(id).await)
    }
}
