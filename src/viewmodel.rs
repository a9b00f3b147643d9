use crate::error::MovieError;
use crate::models::{Movie, MoviesResponse};
use crate::observable::Observable;
use crate::usecase::{GetPopularMovies, SearchMovies};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// Owns the state the browse and detail screens render.
///
/// Fetches follow cancel-and-replace: starting a fetch aborts the one in
/// flight, and a result from a superseded fetch is dropped on arrival. The
/// newest request always decides `movies`, and `is_loading` only drops back to
/// `false` once that newest request has settled.
///
/// State changes are applied while the holder's internal lock is held, so
/// listeners registered on its observables must not call back into the
/// holder synchronously; spawn instead.
pub struct MoviesViewModel {
    get_popular: GetPopularMovies,
    search_movies: SearchMovies,
    movies: Observable<Vec<Movie>>,
    is_loading: Observable<bool>,
    selected_movie: Observable<Option<Movie>>,
    last_error: Observable<Option<MovieError>>,
    inflight: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    generation: u64,
    task: Option<AbortHandle>,
}

impl MoviesViewModel {
    pub fn new(get_popular: GetPopularMovies, search_movies: SearchMovies) -> Arc<Self> {
        Arc::new(Self {
            get_popular,
            search_movies,
            movies: Observable::new(Vec::new()),
            is_loading: Observable::new(false),
            selected_movie: Observable::new(None),
            last_error: Observable::new(None),
            inflight: Mutex::new(InFlight::default()),
        })
    }

    pub fn movies(&self) -> &Observable<Vec<Movie>> {
        &self.movies
    }

    pub fn is_loading(&self) -> &Observable<bool> {
        &self.is_loading
    }

    pub fn selected_movie(&self) -> &Observable<Option<Movie>> {
        &self.selected_movie
    }

    /// Failure of the most recent fetch; cleared when the next one starts.
    pub fn last_error(&self) -> &Observable<Option<MovieError>> {
        &self.last_error
    }

    /// Fetches the first page of popular movies. Must be called from within a
    /// Tokio runtime; the returned handle resolves once the fetch has settled
    /// (or errors as cancelled if a newer fetch replaced it).
    pub fn load_popular(self: &Arc<Self>) -> JoinHandle<()> {
        let usecase = self.get_popular.clone();
        self.launch("popular", async move { usecase.execute(1).await })
    }

    pub fn search(self: &Arc<Self>, query: &str) -> JoinHandle<()> {
        let usecase = self.search_movies.clone();
        let query = query.to_string();
        self.launch("search", async move { usecase.execute(&query, 1).await })
    }

    pub fn select_movie(&self, movie: Movie) {
        self.selected_movie.set(Some(movie));
    }

    pub fn movie_by_id(&self, id: i32) -> Option<Movie> {
        self.movies.get().into_iter().find(|m| m.id == id)
    }

    fn launch<F>(self: &Arc<Self>, label: &'static str, fetch: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<MoviesResponse, MovieError>> + Send + 'static,
    {
        let mut inflight = self.lock_inflight();
        inflight.generation += 1;
        let generation = inflight.generation;
        if let Some(previous) = inflight.task.take() {
            debug!("{} fetch #{} replaces an in-flight fetch", label, generation);
            previous.abort();
        }
        self.last_error.set(None);
        self.is_loading.set(true);

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = fetch.await;
            this.settle(generation, label, outcome);
        });
        inflight.task = Some(handle.abort_handle());
        handle
    }

    fn settle(&self, generation: u64, label: &str, outcome: Result<MoviesResponse, MovieError>) {
        let mut inflight = self.lock_inflight();
        if inflight.generation != generation {
            debug!("Discarding superseded {} fetch #{}", label, generation);
            return;
        }
        inflight.task = None;
        match outcome {
            Ok(response) => {
                info!(
                    "{} fetch returned {} movies (page {} of {})",
                    label,
                    response.results.len(),
                    response.page,
                    response.total_pages
                );
                self.movies.set(response.results);
            }
            Err(err) => {
                warn!("{} fetch failed, keeping current list: {}", label, err);
                self.last_error.set(Some(err));
            }
        }
        self.is_loading.set(false);
    }

    fn lock_inflight(&self) -> MutexGuard<'_, InFlight> {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MovieRepository;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    struct Script {
        gate: Option<oneshot::Receiver<()>>,
        result: Result<MoviesResponse, MovieError>,
    }

    #[derive(Default)]
    struct ScriptedRepository {
        popular: Mutex<VecDeque<Script>>,
        search: Mutex<VecDeque<Script>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedRepository {
        async fn play(queue: &Mutex<VecDeque<Script>>) -> Result<MoviesResponse, MovieError> {
            let script = queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected repository call");
            if let Some(gate) = script.gate {
                let _ = gate.await;
            }
            script.result
        }
    }

    #[async_trait]
    impl MovieRepository for ScriptedRepository {
        async fn popular_movies(&self, page: i32) -> Result<MoviesResponse, MovieError> {
            assert_eq!(page, 1);
            Self::play(&self.popular).await
        }
        async fn search_movies(
            &self,
            query: &str,
            page: i32,
        ) -> Result<MoviesResponse, MovieError> {
            assert_eq!(page, 1);
            self.queries.lock().unwrap().push(query.to_string());
            Self::play(&self.search).await
        }
        async fn movie_details(&self, _id: i32) -> Result<Movie, MovieError> {
            unreachable!("view model never fetches details")
        }
    }

    fn movie(id: i32, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: None,
            backdrop_path: None,
            overview: String::new(),
            release_date: "2020-01-01".to_string(),
            vote_average: 7.3,
        }
    }

    fn page(movies: Vec<Movie>) -> MoviesResponse {
        let total = movies.len() as i32;
        MoviesResponse {
            page: 1,
            results: movies,
            total_pages: 1,
            total_results: total,
        }
    }

    fn ready(result: Result<MoviesResponse, MovieError>) -> Script {
        Script { gate: None, result }
    }

    fn view_model(repo: Arc<ScriptedRepository>) -> Arc<MoviesViewModel> {
        MoviesViewModel::new(GetPopularMovies::new(repo.clone()), SearchMovies::new(repo))
    }

    fn record_loading(vm: &MoviesViewModel) -> Arc<Mutex<Vec<bool>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let record = move |v: &bool| sink.lock().unwrap().push(*v);
        vm.is_loading().subscribe(record);
        seen
    }

    #[tokio::test]
    async fn loading_flag_brackets_a_successful_fetch() {
        let repo = Arc::new(ScriptedRepository::default());
        repo.popular
            .lock()
            .unwrap()
            .push_back(ready(Ok(page(vec![movie(1, "X")]))));
        let vm = view_model(repo);
        let loading = record_loading(&vm);

        let handle = vm.load_popular();
        assert_eq!(*loading.lock().unwrap(), vec![false, true]);

        handle.await.expect("fetch task");
        assert_eq!(*loading.lock().unwrap(), vec![false, true, false]);
        assert_eq!(vm.movies().get(), vec![movie(1, "X")]);
        assert_eq!(vm.last_error().get(), None);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_list_and_reports_error() {
        let repo = Arc::new(ScriptedRepository::default());
        repo.popular
            .lock()
            .unwrap()
            .push_back(ready(Ok(page(vec![movie(1, "X"), movie(2, "Y")]))));
        repo.search
            .lock()
            .unwrap()
            .push_back(ready(Err(MovieError::Transport("offline".to_string()))));
        let vm = view_model(repo);

        vm.load_popular().await.expect("popular task");
        let before = vm.movies().get();
        let loading = record_loading(&vm);

        vm.search("alien").await.expect("search task");
        assert_eq!(vm.movies().get(), before);
        assert_eq!(*loading.lock().unwrap(), vec![false, true, false]);
        assert_eq!(
            vm.last_error().get(),
            Some(MovieError::Transport("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn error_is_cleared_when_next_fetch_starts() {
        let repo = Arc::new(ScriptedRepository::default());
        {
            let mut popular = repo.popular.lock().unwrap();
            popular.push_back(ready(Err(MovieError::Decode("bad".to_string()))));
            popular.push_back(ready(Ok(page(vec![movie(3, "Z")]))));
        }
        let vm = view_model(repo);

        vm.load_popular().await.expect("first task");
        assert!(vm.last_error().get().is_some());

        let handle = vm.load_popular();
        assert_eq!(vm.last_error().get(), None);
        handle.await.expect("second task");
        assert_eq!(vm.movies().get(), vec![movie(3, "Z")]);
    }

    #[tokio::test]
    async fn newer_fetch_replaces_slower_earlier_one() {
        let repo = Arc::new(ScriptedRepository::default());
        let (release_slow, slow_gate) = oneshot::channel();
        repo.popular.lock().unwrap().push_back(Script {
            gate: Some(slow_gate),
            result: Ok(page(vec![movie(1, "Popular")])),
        });
        repo.search
            .lock()
            .unwrap()
            .push_back(ready(Ok(page(vec![movie(2, "Searched")]))));
        let vm = view_model(repo.clone());
        let loading = record_loading(&vm);

        let slow = vm.load_popular();
        tokio::task::yield_now().await;
        let fast = vm.search("alien");
        fast.await.expect("search task");

        assert!(slow.await.unwrap_err().is_cancelled());
        let _ = release_slow.send(());
        tokio::task::yield_now().await;

        assert_eq!(vm.movies().get(), vec![movie(2, "Searched")]);
        assert_eq!(*loading.lock().unwrap(), vec![false, true, false]);
        assert_eq!(*repo.queries.lock().unwrap(), vec!["alien".to_string()]);
    }

    #[tokio::test]
    async fn panicking_listener_does_not_leave_loading_stuck() {
        let repo = Arc::new(ScriptedRepository::default());
        repo.popular
            .lock()
            .unwrap()
            .push_back(ready(Ok(page(vec![movie(1, "X")]))));
        let vm = view_model(repo);
        vm.movies().subscribe(|movies: &Vec<Movie>| {
            if !movies.is_empty() {
                panic!("render failed");
            }
        });
        let loading = record_loading(&vm);

        vm.load_popular().await.expect("fetch task");

        assert_eq!(vm.movies().get(), vec![movie(1, "X")]);
        assert!(!vm.is_loading().get());
        assert_eq!(*loading.lock().unwrap(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn selection_round_trips_and_lookup_uses_current_list() {
        let repo = Arc::new(ScriptedRepository::default());
        repo.popular
            .lock()
            .unwrap()
            .push_back(ready(Ok(page(vec![movie(1, "X"), movie(2, "Y")]))));
        let vm = view_model(repo);
        vm.load_popular().await.expect("popular task");

        vm.select_movie(movie(2, "Y"));
        assert_eq!(vm.selected_movie().get(), Some(movie(2, "Y")));
        assert_eq!(vm.movie_by_id(1), Some(movie(1, "X")));
        assert_eq!(vm.movie_by_id(99), None);
    }
}
