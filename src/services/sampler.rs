use crate::models::{Sample, SeriesView, ViewConfig};
use crate::services::probe::{ProbeError, UsageReader};
use crate::services::sample_buffer::SampleBuffer;
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

/// 采样器生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerState {
    Created,
    Running,
    /// 目标进程已退出
    Terminated,
    /// 其他读取错误（例如权限被收回）
    Failed,
    /// 被会话主动关闭
    Cancelled,
}

impl SamplerState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SamplerState::Created | SamplerState::Running)
    }
}

impl fmt::Display for SamplerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SamplerState::Created => "created",
            SamplerState::Running => "running",
            SamplerState::Terminated => "terminated",
            SamplerState::Failed => "failed",
            SamplerState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// 采样结束的原因
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerEnd {
    pub state: SamplerState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Sampled(Sample),
    Ended(SamplerEnd),
    /// 不在运行状态，什么也没做
    Idle,
}

/// 单个进程的采样状态机，拥有自己的滑动窗口
pub struct ProcessSampler {
    pid: u32,
    reader: Box<dyn UsageReader>,
    buffer: SampleBuffer,
    state: SamplerState,
    started_at: Option<Instant>,
}

impl ProcessSampler {
    pub fn new(pid: u32, reader: Box<dyn UsageReader>, capacity: usize) -> Self {
        Self {
            pid,
            reader,
            buffer: SampleBuffer::new(capacity),
            state: SamplerState::Created,
            started_at: None,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Created -> Running，重复调用无效果
    pub fn start(&mut self) -> bool {
        if self.state != SamplerState::Created {
            return false;
        }
        self.state = SamplerState::Running;
        self.started_at = Some(Instant::now());
        true
    }

    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = SamplerState::Cancelled;
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        let started_at = match (self.state, self.started_at) {
            (SamplerState::Running, Some(at)) => at,
            _ => return TickOutcome::Idle,
        };

        match self.reader.read_usage() {
            Ok(usage) => {
                let sample = Sample {
                    t: started_at.elapsed().as_secs_f64(),
                    cpu: usage.cpu_percent.max(0.0),
                    mem: usage.memory_percent.max(0.0),
                };
                self.buffer.append(sample);
                TickOutcome::Sampled(sample)
            }
            Err(ProbeError::NoSuchProcess { .. }) => {
                self.state = SamplerState::Terminated;
                TickOutcome::Ended(SamplerEnd {
                    state: self.state,
                    message: format!("process {} has ended", self.pid),
                })
            }
            Err(e) => {
                self.state = SamplerState::Failed;
                TickOutcome::Ended(SamplerEnd {
                    state: self.state,
                    message: format!("error reading process {}: {}", self.pid, e),
                })
            }
        }
    }

    pub fn view(&self, config: &ViewConfig) -> SeriesView {
        self.buffer.view(self.pid, config)
    }
}
