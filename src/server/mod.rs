mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::server::handlers::{drivers, trips};

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/trips", post(trips::create))
        .route("/trips/:id", get(trips::find))
        .route("/trips/:id/accept", patch(trips::accept))
        .route("/trips/:id/status", patch(trips::update_status))
        .route("/trips/:id/cancel", patch(trips::cancel))
        .route("/drivers", post(drivers::create))
        .route("/drivers/:id", get(drivers::find))
        .route("/drivers/:id/location", patch(drivers::update_location))
        .route("/drivers/:id/availability", patch(drivers::set_availability))
        .layer(Extension(api));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
