//! HTTP surface: the panel endpoint and its shared state.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::compose::{RenderContext, compose};
use crate::constants::{DEFAULT_BG, PANEL_CACHE_CONTROL, SVG_CONTENT_TYPE};
use crate::error::ToonError;
use crate::layouts::{Field, LayoutResolver};
use crate::text::TextBlock;

pub mod images;

use images::{AssetKind, ImageInliner, ImageRef, locate};

/// State shared read-only by every request.
#[derive(Clone, Debug)]
pub struct AppState {
    resolver: Arc<LayoutResolver>,
    inliner: ImageInliner,
}

impl AppState {
    /// Bundles the layout resolver and image inliner.
    pub fn new(resolver: LayoutResolver, inliner: ImageInliner) -> Self {
        Self {
            resolver: Arc::new(resolver),
            inliner,
        }
    }
}

/// Query parameters of the panel endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PanelParams {
    /// Layout selector and background index, defaults to `1`
    pub bg: Option<String>,
    /// Illustration reference
    pub img: Option<String>,
    /// Caption
    pub de: Option<String>,
    /// First dialogue line(s)
    #[serde(alias = "text1")]
    pub text: Option<String>,
    /// Second dialogue line(s)
    pub text2: Option<String>,
    /// Effect text
    pub ef: Option<String>,
}

impl PanelParams {
    fn bg(&self) -> &str {
        self.bg
            .as_deref()
            .map(str::trim)
            .filter(|bg| !bg.is_empty())
            .unwrap_or(DEFAULT_BG)
    }
}

/// Fetches an image, treating every failure as "no image".
async fn inline_asset(
    state: &AppState,
    kind: AssetKind,
    reference: Option<ImageRef>,
) -> Option<String> {
    let reference = reference?;
    let origin = match locate(&state.resolver.table().assets, kind, &reference) {
        Ok(origin) => origin,
        Err(err) => {
            debug!("Could not locate {:?} {:?}: {}", kind, reference, err);
            return None;
        }
    };
    state.inliner.inline(&origin).await
}

/// Builds the panel for one request.
pub async fn render_panel(state: &AppState, params: &PanelParams) -> Result<String, ToonError> {
    let bg = params.bg();
    let layout = state.resolver.resolve(bg)?;

    // visibility is settled before any text is processed
    let caption = TextBlock::from_param(params.de.as_deref(), layout.shows(Field::Caption));
    let dialogue_visible = layout.shows(Field::Dialogue);
    let dialogue = [
        TextBlock::from_param(params.text.as_deref(), dialogue_visible),
        TextBlock::from_param(params.text2.as_deref(), dialogue_visible),
    ];
    let effect = TextBlock::from_param(params.ef.as_deref(), layout.shows(Field::Effect));

    let illustration_ref = params
        .img
        .as_deref()
        .filter(|_| layout.shows(Field::Illustration))
        .and_then(ImageRef::parse);
    let (background, illustration) = tokio::join!(
        inline_asset(state, AssetKind::Background, ImageRef::parse(bg)),
        inline_asset(state, AssetKind::Illustration, illustration_ref),
    );

    let ctx = RenderContext {
        canvas: &state.resolver.table().canvas,
        layout: &layout,
        background,
        illustration,
        caption,
        dialogue,
        effect,
    };
    compose(&ctx)
}

async fn panel_handler(
    State(state): State<AppState>,
    params: Result<Query<PanelParams>, QueryRejection>,
) -> Result<Response, ToonError> {
    let Query(params) = params.map_err(|err| ToonError::BadRequest(err.body_text()))?;
    let svg = render_panel(&state, &params).await?;
    Ok((
        [(CONTENT_TYPE, SVG_CONTENT_TYPE), (CACHE_CONTROL, PANEL_CACHE_CONTROL)],
        svg,
    )
        .into_response())
}

async fn health_handler() -> &'static str {
    "ok"
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(panel_handler))
        .route("/api/svg", axum::routing::get(panel_handler))
        .route("/healthz", axum::routing::get(health_handler))
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Serves the panel endpoint until Ctrl-C.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
