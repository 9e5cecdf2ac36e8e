//! rollcalld: attendance daemon.
//!
//! Serves the registration and attendance HTTP API over a SQLite database
//! and an in-memory registry of known faces.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use rollcall_core::{FaceEngine, PlaceholderEngine};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod uploads;

use config::Config;
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(routes::health))
        .route("/student/register", post(routes::register_student))
        .route("/students", get(routes::list_students))
        .route("/teacher/login", post(routes::teacher_login))
        .route("/teacher/mark_attendance", post(routes::mark_attendance))
        .route("/teacher/manual_mark", post(routes::manual_mark))
        .route("/face/recognize", post(routes::recognize_faces))
        .route("/face/mark_attendance", post(routes::mark_attendance_from_faces))
        .route("/face/reload", post(routes::reload_faces))
        .route("/face/status", get(routes::face_status))
        .route("/attendance/reset", post(routes::reset_attendance))
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::attach_error_detail,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Initialize state with the placeholder engine and serve until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engine: Arc<dyn FaceEngine> = Arc::new(PlaceholderEngine);
    tracing::warn!("using placeholder face engine; recognition results are mock data");

    let addr = config.addr;
    let state = AppState::initialize(config, engine).await?;
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "rollcalld listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("rollcalld shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
