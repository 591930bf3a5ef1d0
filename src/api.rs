use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::disclosure::{DisclosurePanels, DriverStopped, Interaction, PanelId, Target};
use crate::dom::Document;
use crate::loader;
use crate::page::{self, RegionsView};
use crate::snapshot::SnapshotClient;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub snapshots: SnapshotClient,
    pub panels: Arc<DisclosurePanels>,
}

impl AppState {
    pub fn new(cfg: Config, snapshots: SnapshotClient, panels: DisclosurePanels) -> Self {
        Self {
            cfg: Arc::new(cfg),
            snapshots,
            panels: Arc::new(panels),
        }
    }

    /// One full page load against the current snapshots.
    pub async fn render_page(&self) -> Document {
        let mut doc = page::markup();
        loader::run(&self.cfg, &self.snapshots, &mut doc).await;
        self.panels.apply(&mut doc);
        doc
    }
}

#[derive(Debug, Deserialize)]
pub struct PanelEvent {
    pub event: Interaction,
    #[serde(default)]
    pub target: Target,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown panel: {0}")]
    NotFound(String),
    #[error(transparent)]
    Closed(#[from] DriverStopped),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Closed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/regions", get(regions))
        .route("/api/panels", get(panel_states))
        .route("/api/panels/:panel/events", post(panel_event))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(cfg: Config, state: AppState) -> eyre::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from((cfg.bind_addr, cfg.port));
    info!("Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.render_page().await.to_html())
}

async fn regions(State(state): State<AppState>) -> Json<RegionsView> {
    Json(page::regions(&state.render_page().await))
}

async fn panel_states(State(state): State<AppState>) -> Json<BTreeMap<PanelId, bool>> {
    Json(state.panels.states())
}

async fn panel_event(
    State(state): State<AppState>,
    Path(panel): Path<String>,
    Json(req): Json<PanelEvent>,
) -> Result<StatusCode, ApiError> {
    let id = PanelId::ALL
        .into_iter()
        .find(|id| id.as_str() == panel)
        .ok_or_else(|| ApiError::NotFound(panel.clone()))?;
    let handle = state
        .panels
        .get(id)
        .ok_or_else(|| ApiError::NotFound(panel.clone()))?;

    debug!("{} panel: {:?} on {:?}", panel, req.event, req.target);
    handle.send(req.event)?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disclosure::HIDE_DELAY;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(base: &str) -> AppState {
        let cfg = Config::default();
        let snapshots = SnapshotClient::new(base).unwrap();
        let panels = DisclosurePanels::wire(&page::markup(), cfg.hover_hide_delay);
        AppState::new(cfg, snapshots, panels)
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_event(panel: &str, body: &str) -> Request<Body> {
        Request::post(format!("/api/panels/{panel}/events"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_rendered_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vault_wallet_2": { "tbtc_balance": 2, "tbtc_usd_value": 1234.5 }
            })))
            .mount(&server)
            .await;

        let app = router(state_for(&server.uri()));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<span id=\"vault-balance\">2.000000</span>"));
        assert!(html.contains("<span id=\"vault-usd\">$1,234.50</span>"));
    }

    #[tokio::test]
    async fn regions_report_fatal_state() {
        let app = router(state_for("http://127.0.0.1:1"));
        let resp = app
            .oneshot(Request::get("/api/regions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let view: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(view["scalars"]["burn-total"], "N/A");
        assert_eq!(
            view["lists"]["swap-transfers"][0]["amount"],
            loader::LOAD_ERROR_TEXT
        );
    }

    #[tokio::test(start_paused = true)]
    async fn panel_events_drive_visibility() {
        let state = state_for("http://127.0.0.1:1");
        let app = router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_event("vault", r#"{"event":"pointer_enter","target":"panel"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        let resp = app
            .clone()
            .oneshot(Request::get("/api/panels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let states: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(states["vault"], true);
        assert_eq!(states["swap"], false);

        app.clone()
            .oneshot(post_event("vault", r#"{"event":"pointer_leave"}"#))
            .await
            .unwrap();
        tokio::time::sleep(HIDE_DELAY * 2).await;
        assert_eq!(state.panels.states().get(&PanelId::Vault), Some(&false));
    }

    #[tokio::test]
    async fn unknown_panel_is_404() {
        let app = router(state_for("http://127.0.0.1:1"));
        let resp = app
            .oneshot(post_event("treasury", r#"{"event":"wheel"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["error"], "unknown panel: treasury");
    }
}
