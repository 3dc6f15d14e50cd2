use std::sync::Arc;

use axum::{Extension, Router};

use crate::routes;
use crate::services::AppServices;

pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .nest("/api/procurement", routes::orders::router())
        .nest("/api/vendors", routes::vendors::router())
        .nest("/api/admin/emails", routes::notifications::router())
        .layer(Extension(services))
}
