use crate::config::AppConfig;
use crate::data::CensusTable;
use crate::locate::LazyLocator;
use crate::store;
use crate::types::SelectionRequest;
use crate::view::{self, ViewModel};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState {
    pub census: Arc<CensusTable>,
    pub config: AppConfig,
}

/// A failed interaction. Load and schema problems are not recoverable by the
/// user, so they all map to `500 Internal Server Error`.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("view failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "something went wrong - please refresh the page and try again".to_owned(),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/api/places", get(places_handler))
        .route("/api/view", get(view_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    // Warm the cache so the first interaction does not pay for the read.
    let census = store::census(&config.input.census)?;

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let state = Arc::new(AppState { census, config });

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn places_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.census.townland_names())
}

// The first map request reads the coordinate workbook, so rendering runs on
// the blocking pool rather than a runtime worker.
async fn view_handler(
    State(state): State<Arc<AppState>>,
    Query(request): Query<SelectionRequest>,
) -> Result<Json<ViewModel>, AppError> {
    let view = tokio::task::spawn_blocking(move || {
        let locator = LazyLocator::new(&state.config.input.geo);
        view::render(&request, &state.census, &locator)
    })
    .await
    .map_err(anyhow::Error::from)??;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, ServerConfig, SourceConfig};
    use crate::filter::tests::sample_census;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn state(geo: &Path) -> Arc<AppState> {
        Arc::new(AppState {
            census: Arc::new(sample_census()),
            config: AppConfig {
                input: InputConfig {
                    census: SourceConfig::new("unused.csv"),
                    geo: SourceConfig::new(geo),
                },
                server: ServerConfig {
                    port: 0,
                    static_dir: PathBuf::from("static"),
                },
            },
        })
    }

    #[tokio::test]
    async fn places_are_sorted() {
        let Json(names) = places_handler(State(state(Path::new("unused.csv")))).await;
        assert_eq!(names, vec!["Ardglass", "Baldongan", "Corduff", "Rush", "TOTAL"]);
    }

    #[tokio::test]
    async fn threshold_view_never_reads_the_geo_file() {
        let request = SelectionRequest {
            threshold: Some(80.0),
            ..Default::default()
        };
        let result = view_handler(
            State(state(Path::new("does-not-exist.csv"))),
            Query(request),
        )
        .await;
        let Ok(Json(view)) = result else { panic!("threshold view failed") };
        assert_eq!(view.result_count, Some(3));
    }

    #[tokio::test]
    async fn place_view_loads_coordinates_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let geo = dir.path().join("places.csv");
        fs::write(&geo, "OS_ID,CENTRE_LAT,CENTRE_LNG\n101,53.58,-6.11\n").unwrap();

        let request = SelectionRequest {
            townland: Some("Ardglass".to_string()),
            ..Default::default()
        };
        let Ok(Json(view)) = view_handler(State(state(&geo)), Query(request)).await else {
            panic!("place view failed")
        };
        assert_eq!(view.map.map(|m| m.lat), Some(53.58));
    }

    fn query(uri: &str) -> Query<SelectionRequest> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        Query::try_from_uri(&uri).unwrap()
    }

    #[tokio::test]
    async fn blank_threshold_from_a_form_selects_the_place() {
        let dir = tempfile::tempdir().unwrap();
        let geo = dir.path().join("places.csv");
        fs::write(&geo, "OS_ID,CENTRE_LAT,CENTRE_LNG\n101,53.58,-6.11\n").unwrap();

        let request = query("/api/view?townland=Ardglass&year=1841&category=Total&threshold=");
        let Ok(Json(view)) = view_handler(State(state(&geo)), request).await else {
            panic!("place view failed")
        };
        assert_eq!(view.warnings, vec!["Null values for 1881"]);
        assert_eq!(view.heading.as_deref(), Some("Ardglass"));
        assert_eq!(view.statistics[0].metrics[0].value, 90);
    }

    #[tokio::test]
    async fn query_category_is_case_insensitive() {
        let request = query("/api/view?year=1881&category=female&threshold=30");
        assert_eq!(request.0.category, crate::types::Category::Female);
        let Ok(Json(view)) = view_handler(State(state(Path::new("unused.csv"))), request).await else {
            panic!("threshold view failed")
        };
        assert_eq!(view.result_count, Some(3));
    }

    #[tokio::test]
    async fn nan_threshold_is_a_warning() {
        let request = query("/api/view?threshold=NaN");
        let Ok(Json(view)) = view_handler(State(state(Path::new("unused.csv"))), request).await else {
            panic!("view failed")
        };
        assert_eq!(view.warnings, vec!["Please enter a finite population threshold"]);
        assert!(view.table.is_none());
    }

    #[tokio::test]
    async fn missing_geo_file_is_a_server_error() {
        let request = SelectionRequest {
            townland: Some("Ardglass".to_string()),
            ..Default::default()
        };
        let result = view_handler(State(state(Path::new("absent-places.csv"))), Query(request)).await;
        let Err(err) = result else { panic!("expected failure") };
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
