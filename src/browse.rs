//! Policies that belong to the screens rather than to the view model.

use crate::error::MovieError;
use crate::models::Movie;
use crate::viewmodel::MoviesViewModel;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Reacts to the search box: an empty query brings back the popular list.
pub fn query_changed(view_model: &Arc<MoviesViewModel>, query: &str) -> JoinHandle<()> {
    let query = query.trim();
    if query.is_empty() {
        view_model.load_popular()
    } else {
        view_model.search(query)
    }
}

/// Resolves the movie a detail screen should show, preferring the current
/// selection and falling back to the loaded list (e.g. when opened by id).
pub fn resolve_detail(view_model: &MoviesViewModel, id: i32) -> Result<Movie, MovieError> {
    if let Some(selected) = view_model.selected_movie().get().filter(|m| m.id == id) {
        return Ok(selected);
    }
    view_model
        .movie_by_id(id)
        .ok_or(MovieError::NotFoundLocal(id))
}
