//! Single-action wrappers over the repository. They hold no logic of their
//! own; the view-state holder depends on these rather than on the repository
//! so each action can be faked on its own in tests.

use crate::error::MovieError;
use crate::models::{Movie, MoviesResponse};
use crate::repository::MovieRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct GetPopularMovies {
    repository: Arc<dyn MovieRepository>,
}

impl GetPopularMovies {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, page: i32) -> Result<MoviesResponse, MovieError> {
        self.repository.popular_movies(page).await
    }
}

#[derive(Clone)]
pub struct SearchMovies {
    repository: Arc<dyn MovieRepository>,
}

impl SearchMovies {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, query: &str, page: i32) -> Result<MoviesResponse, MovieError> {
        self.repository.search_movies(query, page).await
    }
}

#[derive(Clone)]
pub struct GetMovieDetails {
    repository: Arc<dyn MovieRepository>,
}

impl GetMovieDetails {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: i32) -> Result<Movie, MovieError> {
        self.repository.movie_details(id).await
    }
}
