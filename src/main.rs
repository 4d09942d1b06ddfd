#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    routes::{
        index::get_index_route,
        students::{
            delete_student, internal_get_select_student, internal_get_students,
            internal_post_reset_form, internal_post_touch_field, post_new_student,
            put_student_changes,
        },
    },
    state::RosterState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{compression::CompressionLayer, services::ServeFile, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod dashboard;
mod data;
mod error;
mod form;
mod maud_conveniences;
mod routes;
mod seed;
mod state;
mod storage;
mod store;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    if let Err(e) = dotenvy::dotenv() {
        warn!(?e, "No .env file loaded, using the process environment");
    }

    let config = RuntimeConfiguration::new().expect("unable to create config");
    let seed_path = config.seed_config().path.clone();
    let state = RosterState::new(&config)
        .await
        .expect("unable to create state");

    let app = Router::new()
        .route("/", get(get_index_route))
        .route(
            "/students",
            post(post_new_student)
                .put(put_student_changes)
                .delete(delete_student),
        )
        .route("/internal/students", get(internal_get_students))
        .route(
            "/internal/students/select",
            get(internal_get_select_student),
        )
        .route("/internal/form/touch", post(internal_post_touch_field))
        .route("/internal/form/reset", post(internal_post_reset_form))
        .route_service("/assets/students.json", ServeFile::new(seed_path))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let server_ip = config.server_ip();
    let listener = TcpListener::bind(server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("unable to serve app");
}
