use anyhow::{Context, Result};
use cinedeck::browse;
use cinedeck::config::Config;
use cinedeck::error::MovieError;
use cinedeck::http::ReqwestAdapter;
use cinedeck::models::{format_rating, release_year, Movie};
use cinedeck::repository::{MovieRepository, TmdbMovieRepository};
use cinedeck::tmdb::{self, MovieApi, TmdbClient};
use cinedeck::usecase::{GetMovieDetails, GetPopularMovies, SearchMovies};
use cinedeck::viewmodel::MoviesViewModel;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: cinedeck popular
       cinedeck search <query>
       cinedeck detail <movie_id>";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Popular,
    Search,
    Detail,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "popular" => Ok(Command::Popular),
            "search" => Ok(Command::Search),
            "detail" => Ok(Command::Detail),
            _ => Err(anyhow::anyhow!("command must be 'popular', 'search' or 'detail'")),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

struct App {
    view_model: Arc<MoviesViewModel>,
    get_details: GetMovieDetails,
}

fn build_app(config: &Config) -> Result<App> {
    let http = Arc::new(ReqwestAdapter::new(config.timeout)?);
    let api: Arc<dyn MovieApi> = Arc::new(TmdbClient::new(http, config));
    let repository: Arc<dyn MovieRepository> = Arc::new(TmdbMovieRepository::new(api));
    let view_model = MoviesViewModel::new(
        GetPopularMovies::new(repository.clone()),
        SearchMovies::new(repository.clone()),
    );
    view_model.is_loading().subscribe(|loading| {
        if *loading {
            info!("Loading movies...");
        }
    });
    Ok(App {
        view_model,
        get_details: GetMovieDetails::new(repository),
    })
}

fn print_list(movies: &[Movie]) {
    if movies.is_empty() {
        println!("No movies found.");
        return;
    }
    for movie in movies {
        println!(
            "{:>8}  {:<4}  {:>4}  {}",
            movie.id,
            release_year(&movie.release_date),
            format_rating(movie.vote_average),
            movie.title
        );
    }
}

fn render_detail(movie: &Movie) -> String {
    let mut lines = vec![
        format!("{} ({})", movie.title, release_year(&movie.release_date)),
        format!("Rating: {}/10", format_rating(movie.vote_average)),
    ];
    if let Some(url) = tmdb::poster_url(movie) {
        lines.push(format!("Poster: {url}"));
    }
    if let Some(url) = tmdb::backdrop_url(movie) {
        lines.push(format!("Backdrop: {url}"));
    }
    lines.push(String::new());
    if movie.overview.is_empty() {
        lines.push("No overview available for this movie.".to_string());
    } else {
        lines.push(movie.overview.clone());
    }
    lines.join("\n")
}

fn report_failure(view_model: &MoviesViewModel) {
    if let Some(err) = view_model.last_error().get() {
        warn!("Showing previous results: {}", err);
    }
}

async fn run(app: App, command: Command, rest: &[String]) -> Result<()> {
    let vm = &app.view_model;
    match command {
        Command::Popular => {
            vm.load_popular().await.context("popular fetch task failed")?;
            report_failure(vm);
            print_list(&vm.movies().get());
        }
        Command::Search => {
            let query = rest.join(" ");
            browse::query_changed(vm, &query)
                .await
                .context("search task failed")?;
            report_failure(vm);
            print_list(&vm.movies().get());
        }
        Command::Detail => {
            let id: i32 = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("missing movie id"))?
                .parse()
                .context("movie_id must be an integer")?;
            vm.load_popular().await.context("popular fetch task failed")?;
            let movie = match browse::resolve_detail(vm, id) {
                Ok(movie) => movie,
                Err(MovieError::NotFoundLocal(_)) => {
                    debug!("Movie {} not in popular list, fetching details", id);
                    app.get_details.execute(id).await?
                }
                Err(e) => return Err(e.into()),
            };
            vm.select_movie(movie.clone());
            println!("{}", render_detail(&movie));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    match dotenv() {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let command = Command::from_str(&args[1])?;

    let config = Config::from_env()?;
    debug!("Using {:?}", config);
    let app = build_app(&config)?;
    run(app, command, &args[2..]).await
}
