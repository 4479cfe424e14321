use crate::metrics::METRICS;
use crate::models::{SeriesView, ViewConfig};
use crate::services::probe::{ProbeError, ProcessProbe};
use crate::services::sample_buffer::DEFAULT_CAPACITY;
use crate::services::sampler::{ProcessSampler, SamplerState, TickOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 采样会话参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// 调度间隔，不等于系统层面的采样精度
    pub tick_interval: Duration,
    /// 滑动窗口容量
    pub capacity: usize,
    pub view: ViewConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            capacity: DEFAULT_CAPACITY,
            view: ViewConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    #[error("process {pid} does not exist")]
    NotFound { pid: u32 },

    #[error("no permission to access process {pid}")]
    AccessDenied { pid: u32 },

    #[error("cannot open process {pid}: {reason}")]
    Probe { pid: u32, reason: String },
}

impl OpenError {
    pub fn is_notice(&self) -> bool {
        matches!(self, OpenError::NotFound { .. })
    }
}

impl From<ProbeError> for OpenError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::NoSuchProcess { pid } => OpenError::NotFound { pid },
            ProbeError::AccessDenied { pid } => OpenError::AccessDenied { pid },
            ProbeError::Other { pid, reason } => OpenError::Probe { pid, reason },
        }
    }
}

/// 推送给展示层的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 每次成功采样后的最新视图
    Tick(SeriesView),
    /// 进程退出或读取失败，只发送一次
    Ended { state: SamplerState, message: String },
}

struct Gate {
    cancelled: bool,
    state: SamplerState,
}

/// 一个详情视图对应的采样会话
///
/// 每个会话独占自己的采样器、缓冲区和调度任务。`cancel` 返回后不会再有采样触发；
/// 监听回调在持有会话锁时执行，不能在回调里关闭同一个会话。
pub struct SamplerSession {
    pid: u32,
    name: String,
    capacity: usize,
    gate: Arc<Mutex<Gate>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SamplerSession {
    /// 必须在 tokio 运行时内调用
    pub fn open<F>(
        probe: &dyn ProcessProbe,
        pid: u32,
        config: &SamplerConfig,
        listener: F,
    ) -> Result<Self, OpenError>
    where
        F: FnMut(SessionEvent) + Send + 'static,
    {
        let record = probe.resolve(pid)?;
        let reader = probe.open_usage(pid)?;

        let mut sampler = ProcessSampler::new(pid, reader, config.capacity);
        sampler.start();
        let capacity = sampler.buffer().capacity();

        let gate = Arc::new(Mutex::new(Gate {
            cancelled: false,
            state: SamplerState::Running,
        }));

        log::info!(
            "📈 Sampling '{}' (PID {}) every {:?}",
            record.name,
            pid,
            config.tick_interval
        );

        let metrics = MetricsGuard::new(pid, &record.name);
        let handle = tokio::spawn(run_sampler(
            sampler,
            metrics,
            Arc::clone(&gate),
            *config,
            listener,
        ));

        Ok(Self {
            pid,
            name: record.name,
            capacity,
            gate,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 实际生效的窗口容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> SamplerState {
        match self.gate.lock() {
            Ok(gate) => gate.state,
            Err(poisoned) => poisoned.into_inner().state,
        }
    }

    /// 幂等；只有第一次调用返回 true
    pub fn cancel(&self) -> bool {
        let first = {
            let mut gate = match self.gate.lock() {
                Ok(gate) => gate,
                Err(poisoned) => poisoned.into_inner(),
            };
            if gate.cancelled {
                false
            } else {
                gate.cancelled = true;
                if !gate.state.is_terminal() {
                    gate.state = SamplerState::Cancelled;
                    METRICS.record_session_end(SamplerState::Cancelled);
                }
                true
            }
        };

        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }

        if first {
            log::info!("Closed sampling session for PID {}", self.pid);
        }
        first
    }
}

impl Drop for SamplerSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 任务结束或被中止时清理该会话的指标
struct MetricsGuard {
    pid_label: String,
    name: String,
}

impl MetricsGuard {
    fn new(pid: u32, name: &str) -> Self {
        METRICS.sessions_open.inc();
        Self {
            pid_label: pid.to_string(),
            name: name.to_string(),
        }
    }
}

impl Drop for MetricsGuard {
    fn drop(&mut self) {
        METRICS.sessions_open.dec();
        METRICS.reset_session_metrics(&self.pid_label, &self.name);
    }
}

async fn run_sampler<F>(
    mut sampler: ProcessSampler,
    metrics: MetricsGuard,
    gate: Arc<Mutex<Gate>>,
    config: SamplerConfig,
    mut listener: F,
) where
    F: FnMut(SessionEvent) + Send + 'static,
{
    let pid = sampler.pid();

    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let mut guard = match gate.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("Sampling session for PID {} lost its state lock", pid);
                break;
            }
        };
        if guard.cancelled {
            sampler.cancel();
            break;
        }

        match sampler.tick() {
            TickOutcome::Sampled(sample) => {
                METRICS.record_sample(&metrics.pid_label, &metrics.name, &sample);
                listener(SessionEvent::Tick(sampler.view(&config.view)));
            }
            TickOutcome::Ended(end) => {
                guard.state = end.state;
                METRICS.record_session_end(end.state);
                match end.state {
                    SamplerState::Terminated => log::info!("{}", end.message),
                    _ => log::warn!("{}", end.message),
                }
                listener(SessionEvent::Ended {
                    state: end.state,
                    message: end.message,
                });
                break;
            }
            TickOutcome::Idle => break,
        }
    }

    log::debug!(
        "Sampler for PID {} stopped with {} retained samples",
        pid,
        sampler.buffer().len()
    );
}
