use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::metrics::METRICS;
use crate::services::KillError;
use crate::state::{lock_state, AppState};

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: String,
}

#[derive(Deserialize)]
pub struct KillRequest {
    /// 列表中选中的条目，例如 "bash (PID: 1003)"
    #[serde(default)]
    pub entry: String,
    /// 结束后刷新列表使用的过滤词
    #[serde(default)]
    pub filter: String,
}

fn entries_json(data: &web::Data<AppState>, filter: &str) -> serde_json::Value {
    let directory = lock_state(data).directory.clone();

    let filtered = if filter.is_empty() { "false" } else { "true" };
    METRICS.enumerations_total.with_label_values(&[filtered]).inc();

    let list: Vec<_> = directory
        .enumerate(filter)
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "entry": e,
                "pid": e.pid,
                "name": e.name,
            })
        })
        .collect();
    serde_json::json!(list)
}

pub async fn list_processes(
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(entries_json(&data, &query.filter))
}

pub async fn kill_process(
    data: web::Data<AppState>,
    req: web::Json<KillRequest>,
) -> impl Responder {
    // 释放锁后再结束进程
    let controller = lock_state(&data).controller.clone();

    match controller.kill(&req.entry) {
        Ok(name) => {
            METRICS.record_kill("success");
            HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "message": format!("'{}' terminated", name),
                "name": name,
                "processes": entries_json(&data, &req.filter),
            }))
        }
        Err(e) => {
            let (status, outcome) = match &e {
                KillError::Malformed(_) => (StatusCode::BAD_REQUEST, "malformed"),
                KillError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                KillError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "access_denied"),
                KillError::Refused { .. } => (StatusCode::CONFLICT, "refused"),
                KillError::Termination { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "failed"),
            };
            METRICS.record_kill(outcome);

            if e.is_notice() {
                log::info!("Kill request for '{}': {}", req.entry, e);
                // 目标已消失，顺便返回刷新后的列表
                return HttpResponse::build(status).json(serde_json::json!({
                    "status": "notice",
                    "message": e.to_string(),
                    "processes": entries_json(&data, &req.filter),
                }));
            }

            log::warn!("Failed to kill '{}': {}", req.entry, e);
            HttpResponse::build(status).json(serde_json::json!({
                "status": "error",
                "message": e.to_string(),
            }))
        }
    }
}
