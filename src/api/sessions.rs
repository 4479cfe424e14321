use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::models::DisplayEntry;
use crate::services::{OpenError, SamplerSession, SessionEvent};
use crate::state::{lock_snapshot, lock_state, AppState, SessionSlot, SessionSnapshot};

/// 打开详情视图：`entry` 优先，其次 `pid`
#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub entry: Option<String>,
    pub pid: Option<u32>,
}

fn error_json(status: StatusCode, kind: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "status": kind,
        "message": message,
    }))
}

pub async fn open_session(
    data: web::Data<AppState>,
    req: web::Json<OpenSessionRequest>,
) -> impl Responder {
    let pid = match (&req.entry, req.pid) {
        (Some(entry), _) => match entry.parse::<DisplayEntry>() {
            Ok(e) => e.pid,
            Err(e) => return error_json(StatusCode::BAD_REQUEST, "error", e.to_string()),
        },
        (None, Some(pid)) => pid,
        (None, None) => {
            return error_json(
                StatusCode::BAD_REQUEST,
                "error",
                "either 'entry' or 'pid' is required".to_string(),
            )
        }
    };

    let mut state = lock_state(&data);

    let snapshot = Arc::new(Mutex::new(SessionSnapshot::default()));
    let sink = Arc::clone(&snapshot);
    let listener = move |event: SessionEvent| {
        let mut snap = lock_snapshot(&sink);
        match event {
            SessionEvent::Tick(view) => snap.latest = Some(view),
            SessionEvent::Ended { state, message } => snap.ended = Some((state, message)),
        }
    };

    let config = state.sampler_config;
    let session = match SamplerSession::open(state.probe.as_ref(), pid, &config, listener) {
        Ok(session) => session,
        Err(e) if e.is_notice() => {
            log::info!("Cannot open details: {}", e);
            return error_json(StatusCode::NOT_FOUND, "notice", e.to_string());
        }
        Err(e) => {
            log::warn!("Cannot open details: {}", e);
            let status = match e {
                OpenError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return error_json(status, "error", e.to_string());
        }
    };

    let id = state.next_session_id;
    state.next_session_id += 1;

    let body = serde_json::json!({
        "id": id,
        "pid": session.pid(),
        "name": session.name(),
        "state": session.state(),
        "capacity": session.capacity(),
    });
    state.sessions.insert(id, SessionSlot { session, snapshot });

    HttpResponse::Created().json(body)
}

pub async fn list_sessions(data: web::Data<AppState>) -> impl Responder {
    let state = lock_state(&data);
    let mut list: Vec<_> = state
        .sessions
        .iter()
        .map(|(id, slot)| {
            serde_json::json!({
                "id": id,
                "pid": slot.session.pid(),
                "name": slot.session.name(),
                "state": slot.session.state(),
                "capacity": slot.session.capacity(),
            })
        })
        .collect();
    list.sort_by_key(|v| v["id"].as_u64());

    HttpResponse::Ok().json(list)
}

pub async fn get_session(
    data: web::Data<AppState>,
    path: web::Path<u64>,
) -> impl Responder {
    let id = path.into_inner();
    let mut state = lock_state(&data);

    let (body, ended) = match state.sessions.get(&id) {
        Some(slot) => {
            // 不在持有快照锁时读取会话状态
            let live_state = slot.session.state();
            let snap = lock_snapshot(&slot.snapshot);
            let (session_state, notice) = match &snap.ended {
                Some((s, message)) => (*s, Some(message.clone())),
                None => (live_state, None),
            };
            let body = serde_json::json!({
                "id": id,
                "pid": slot.session.pid(),
                "name": slot.session.name(),
                "state": session_state,
                "series": snap.latest,
                "notice": notice,
            });
            (body, snap.ended.is_some())
        }
        None => {
            return error_json(
                StatusCode::NOT_FOUND,
                "error",
                format!("session {} not found", id),
            )
        }
    };

    // 结束提示只返回一次，之后释放会话
    if ended {
        state.sessions.remove(&id);
    }

    HttpResponse::Ok().json(body)
}

pub async fn close_session(
    data: web::Data<AppState>,
    path: web::Path<u64>,
) -> impl Responder {
    let id = path.into_inner();
    let slot = lock_state(&data).sessions.remove(&id);

    match slot {
        Some(slot) => {
            slot.session.cancel();
            HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "message": format!("session {} closed", id),
            }))
        }
        None => error_json(
            StatusCode::NOT_FOUND,
            "error",
            format!("session {} not found", id),
        ),
    }
}
