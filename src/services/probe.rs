use crate::models::{ProcessRecord, Usage};
use thiserror::Error;

/// 单个进程查询失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// 进程已退出（包括僵尸进程）
    #[error("process {pid} no longer exists")]
    NoSuchProcess { pid: u32 },

    #[error("access denied to process {pid}")]
    AccessDenied { pid: u32 },

    #[error("failed to query process {pid}: {reason}")]
    Other { pid: u32, reason: String },
}

/// 宿主系统的进程表能力
///
/// `pids` 对进程表做一次遍历；`read` 读取其中一项，此时进程可能已经消失，
/// 调用方必须逐项处理错误。
pub trait ProcessProbe: Send + Sync {
    fn pids(&self) -> Vec<u32>;

    fn read(&self, pid: u32) -> Result<ProcessRecord, ProbeError>;

    /// 按 PID 单独查询一次进程的最新状态，不依赖上一次 `pids` 的结果
    fn resolve(&self, pid: u32) -> Result<ProcessRecord, ProbeError>;

    /// 强制结束进程，不等待退出确认
    fn terminate(&self, pid: u32) -> Result<(), ProbeError>;

    /// 为单个会话打开独立的资源读取器
    fn open_usage(&self, pid: u32) -> Result<Box<dyn UsageReader>, ProbeError>;
}

/// 单个进程的 CPU / 内存读取器
///
/// CPU 使用率基于两次读取之间的差值计算，调用本身不阻塞等待。
pub trait UsageReader: Send {
    fn read_usage(&mut self) -> Result<Usage, ProbeError>;
}
