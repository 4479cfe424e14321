use crate::models::SeriesView;
use crate::services::sampler::SamplerState;
use crate::services::{
    ProcessController, ProcessDirectory, ProcessProbe, SamplerConfig, SamplerSession,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 详情视图最近一次收到的数据
#[derive(Debug, Default)]
pub struct SessionSnapshot {
    pub latest: Option<SeriesView>,
    /// 结束状态与提示，只展示一次
    pub ended: Option<(SamplerState, String)>,
}

pub struct SessionSlot {
    pub session: SamplerSession,
    pub snapshot: Arc<Mutex<SessionSnapshot>>,
}

pub struct AppStateInner {
    pub probe: Arc<dyn ProcessProbe>,
    pub directory: ProcessDirectory,
    pub controller: ProcessController,
    pub sampler_config: SamplerConfig,
    pub sessions: HashMap<u64, SessionSlot>,
    pub next_session_id: u64,
}

pub type AppState = Arc<Mutex<AppStateInner>>;

pub fn new_state(probe: Arc<dyn ProcessProbe>, sampler_config: SamplerConfig) -> AppState {
    Arc::new(Mutex::new(AppStateInner {
        directory: ProcessDirectory::new(probe.clone()),
        controller: ProcessController::new(probe.clone()),
        probe,
        sampler_config,
        sessions: HashMap::new(),
        next_session_id: 1,
    }))
}

/// 锁中毒时直接取出内部数据
pub fn lock_state(state: &AppState) -> MutexGuard<'_, AppStateInner> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn lock_snapshot(snapshot: &Mutex<SessionSnapshot>) -> MutexGuard<'_, SessionSnapshot> {
    snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
