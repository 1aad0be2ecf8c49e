use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    core::selection::Selection,
    prelude::*,
    render::{AnimationSpec, Dashboard, MapSpec},
};

const INDEX: &str = include_str!("../assets/index.html");

pub fn router(dashboard: Arc<Dashboard>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(get_index))
        .route("/api/options", get(get_options))
        .route("/api/map", get(get_map))
        .route("/api/animation", get(get_animation))
        .with_state(dashboard)
        .layer((TraceLayer::new_for_http(), TimeoutLayer::new(request_timeout)))
}

pub async fn serve(listener: TcpListener, router: Router) -> Result {
    info!(address = ?listener.local_addr().ok(), "serving…");
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Per <https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs>.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {error:#}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!("failed to install the signal handler: {error:#}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down…");
}

async fn get_index() -> Html<&'static str> {
    Html(INDEX)
}

#[derive(Serialize)]
struct Options {
    years: Vec<i32>,
    default_year: i32,
    countries: Vec<String>,
}

async fn get_options(State(dashboard): State<Arc<Dashboard>>) -> Json<Options> {
    let selection = dashboard.default_selection();
    Json(Options {
        years: dashboard.years().collect(),
        default_year: selection.year,
        countries: selection.countries,
    })
}

/// Omitted `countries` selects everything, an empty `countries=` selects nothing.
#[serde_as]
#[derive(Deserialize)]
struct MapQuery {
    year: Option<i32>,

    #[serde_as(as = "Option<StringWithSeparator<CommaSeparator, String>>")]
    countries: Option<Vec<String>>,
}

impl MapQuery {
    fn into_selection(self, dashboard: &Dashboard) -> Selection {
        let default = dashboard.default_selection();
        Selection::new(
            self.year.unwrap_or(default.year),
            self.countries.unwrap_or(default.countries),
        )
    }
}

#[instrument(skip_all)]
async fn get_map(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<MapQuery>,
) -> Json<MapSpec> {
    let selection = query.into_selection(&dashboard);
    Json(dashboard.render(&selection))
}

#[instrument(skip_all)]
async fn get_animation(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<MapQuery>,
) -> Json<AnimationSpec> {
    let countries = query.into_selection(&dashboard).countries;
    Json(dashboard.render_animation(&countries))
}
