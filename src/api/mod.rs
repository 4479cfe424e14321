pub mod processes;
pub mod sessions;
pub mod metrics;

pub use processes::{list_processes, kill_process};
pub use sessions::{open_session, list_sessions, get_session, close_session};
pub use metrics::get_metrics;

use actix_web::{web, HttpResponse, Responder};

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/process/list", web::get().to(list_processes))
        .route("/api/process/kill", web::post().to(kill_process))
        .route("/api/session", web::post().to(open_session))
        .route("/api/session", web::get().to(list_sessions))
        .route("/api/session/{id}", web::get().to(get_session))
        .route("/api/session/{id}", web::delete().to(close_session))
        .route("/metrics", web::get().to(get_metrics))
        .route("/health", web::get().to(health));
}
