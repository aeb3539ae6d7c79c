use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::extract::{Form, Json, MatchedPath, Query, State};
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{Span, error, info};

use crate::catalog::Group;
use crate::dashboard::{Dashboard, Page};
use crate::error::{DataAccessError, Error, ErrorResponse};
use crate::render::Templates;
use crate::table::Table;

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub query: Option<String>,
}

impl QueryParams {
    fn label(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub label: &'static str,
    pub group: Group,
    pub sql: String,
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
    templates: Arc<Templates>,
}

impl AppState {
    fn html(&self, page: Result<Page, DataAccessError>) -> Response {
        let html = page
            .map_err(Error::from)
            .and_then(|page| Ok(self.templates.page(&page)?));
        match html {
            Ok(html) => Html(html).into_response(),
            Err(err) => self.error_response(err),
        }
    }

    fn error_response(&self, err: Error) -> Response {
        error!(%err, "failed to render page");
        let body = self
            .templates
            .error_page(&err)
            .unwrap_or_else(|_| err.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

pub fn router(dashboard: Arc<Dashboard>) -> Result<Router, Error> {
    let state = AppState {
        dashboard,
        templates: Arc::new(Templates::new()?),
    };
    let router = Router::new()
        .route("/", get(index))
        .route("/run", post(run))
        .route("/refresh", post(refresh))
        .route("/api/catalog", get(catalog))
        .route("/api/run", post(api_run))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);
                    tracing::info_span!("req", method = ?req.method(), matched_path)
                })
                .on_failure(
                    |err: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        error!(error = ?err, "request failed");
                    },
                ),
        );
    Ok(router)
}

pub async fn serve(addr: SocketAddr, dashboard: Arc<Dashboard>) -> Result<(), Error> {
    let app = router(dashboard)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(http.addr = ?addr, "dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    let page = state.dashboard.page(params.label()).await;
    state.html(page)
}

async fn run(State(state): State<AppState>, Form(params): Form<QueryParams>) -> Response {
    let page = state.dashboard.run_page(params.label()).await;
    state.html(page)
}

async fn refresh(State(state): State<AppState>) -> Redirect {
    state.dashboard.on_refresh().await;
    Redirect::to("/")
}

async fn catalog(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    let store = state.dashboard.store();
    let entries = state
        .dashboard
        .catalog()
        .definitions()
        .iter()
        .map(|definition| CatalogEntry {
            label: definition.label,
            group: definition.group,
            sql: definition.sql(store.table_name(), store.dialect()),
        })
        .collect();
    Json(entries)
}

async fn api_run(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<Table>, Json<ErrorResponse>> {
    state
        .dashboard
        .on_run(Some(&req.label))
        .await
        .map(Json)
        .map_err(ErrorResponse::from)
        .map_err(Json)
}

async fn healthz() -> impl IntoResponse {
    "OK"
}
