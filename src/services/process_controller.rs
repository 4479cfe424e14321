use crate::models::{DisplayEntry, DisplayEntryError};
use crate::services::probe::{ProbeError, ProcessProbe};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KillError {
    #[error(transparent)]
    Malformed(#[from] DisplayEntryError),

    #[error("process {pid} no longer exists")]
    NotFound { pid: u32 },

    #[error("access denied to process {pid}")]
    AccessDenied { pid: u32 },

    #[error("refusing to terminate PID {pid} ({reason})")]
    Refused { pid: u32, reason: &'static str },

    #[error("failed to terminate process {pid}: {reason}")]
    Termination { pid: u32, reason: String },
}

impl KillError {
    /// 目标已经不存在时只需提示，不算错误
    pub fn is_notice(&self) -> bool {
        matches!(self, KillError::NotFound { .. })
    }
}

/// 进程控制：把列表条目解析回 PID 并结束该进程
///
/// 结束后不会刷新目录，由调用方负责。
#[derive(Clone)]
pub struct ProcessController {
    probe: Arc<dyn ProcessProbe>,
}

impl ProcessController {
    pub fn new(probe: Arc<dyn ProcessProbe>) -> Self {
        Self { probe }
    }

    /// 成功时返回进程名称
    pub fn kill(&self, entry: &str) -> Result<String, KillError> {
        let entry: DisplayEntry = entry.parse()?;
        let pid = entry.pid;

        if pid == 0 {
            return Err(KillError::Refused {
                pid,
                reason: "kernel scheduler",
            });
        }
        if pid == std::process::id() {
            return Err(KillError::Refused {
                pid,
                reason: "procwatch itself",
            });
        }

        let record = self.probe.resolve(pid).map_err(|e| kill_error(pid, e))?;
        if record.name != entry.name {
            log::warn!(
                "PID {} is now '{}' (listed as '{}'), terminating anyway",
                pid,
                record.name,
                entry.name
            );
        }

        self.probe.terminate(pid).map_err(|e| kill_error(pid, e))?;

        log::info!("✓ Terminated '{}' (PID {})", record.name, pid);
        Ok(record.name)
    }
}

fn kill_error(pid: u32, err: ProbeError) -> KillError {
    match err {
        ProbeError::NoSuchProcess { .. } => KillError::NotFound { pid },
        ProbeError::AccessDenied { .. } => KillError::AccessDenied { pid },
        ProbeError::Other { reason, .. } => KillError::Termination { pid, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake_probe::{Access, FakeProbe};
    use crate::services::process_directory::ProcessDirectory;

    fn controller(probe: &FakeProbe) -> ProcessController {
        ProcessController::new(Arc::new(probe.clone()))
    }

    #[test]
    fn test_kill_returns_name() {
        let probe = FakeProbe::with_processes(&[(1001, "chrome"), (1003, "bash")]);
        let name = controller(&probe).kill("bash (PID: 1003)").unwrap();

        assert_eq!(name, "bash");
        assert_eq!(probe.killed(), vec![1003]);
    }

    #[test]
    fn test_kill_vanished_process() {
        let probe = FakeProbe::with_processes(&[(1001, "chrome"), (1003, "bash")]);
        let directory = ProcessDirectory::new(Arc::new(probe.clone()));
        let stale = directory.enumerate("bash")[0].to_string();

        probe.remove(1003);

        let err = controller(&probe).kill(&stale).unwrap_err();
        assert_eq!(err, KillError::NotFound { pid: 1003 });
        assert!(err.is_notice());

        let entries = directory.enumerate("");
        assert!(entries.iter().all(|e| e.name != "bash"));
        assert!(probe.killed().is_empty());
    }

    #[test]
    fn test_kill_malformed_selection() {
        let probe = FakeProbe::with_processes(&[(1003, "bash")]);
        let ctl = controller(&probe);

        assert_eq!(
            ctl.kill(""),
            Err(KillError::Malformed(DisplayEntryError::Empty))
        );
        assert!(matches!(
            ctl.kill("bash 1003"),
            Err(KillError::Malformed(DisplayEntryError::Malformed(_)))
        ));
        assert!(probe.killed().is_empty());
    }

    #[test]
    fn test_kill_access_denied() {
        let probe = FakeProbe::new();
        probe.insert_with(1, "init", Access::Denied);

        assert_eq!(
            controller(&probe).kill("init (PID: 1)"),
            Err(KillError::AccessDenied { pid: 1 })
        );
    }

    #[test]
    fn test_kill_rejected_by_os() {
        let probe = FakeProbe::with_processes(&[(77, "stubborn")]);
        probe.set_killable(77, false);

        let err = controller(&probe).kill("stubborn (PID: 77)").unwrap_err();
        assert!(matches!(err, KillError::Termination { pid: 77, .. }));
        assert!(err.to_string().contains("operation not permitted"));
    }

    #[test]
    fn test_kill_refuses_self_and_pid_zero() {
        let probe = FakeProbe::new();
        let ctl = controller(&probe);
        let me = std::process::id();

        assert!(matches!(
            ctl.kill(&format!("procwatch (PID: {})", me)),
            Err(KillError::Refused { .. })
        ));
        assert!(matches!(
            ctl.kill("idle (PID: 0)"),
            Err(KillError::Refused { pid: 0, .. })
        ));
    }

    #[test]
    fn test_kill_reused_pid_uses_current_name() {
        let probe = FakeProbe::with_processes(&[(500, "newcomer")]);
        let name = controller(&probe).kill("oldtimer (PID: 500)").unwrap();
        assert_eq!(name, "newcomer");
    }
}
