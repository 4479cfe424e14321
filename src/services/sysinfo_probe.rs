use crate::models::{ProcessRecord, Usage};
use crate::services::probe::{ProbeError, ProcessProbe, UsageReader};
use std::sync::{Mutex, MutexGuard};
use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System,
};

/// 基于 sysinfo 的进程表实现
///
/// `pids` 刷新整张进程表，`read` 读取上一次刷新的结果。
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn lock(&self, pid: u32) -> Result<MutexGuard<'_, System>, ProbeError> {
        self.system.lock().map_err(|_| ProbeError::Other {
            pid,
            reason: "process table lock poisoned".to_string(),
        })
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn is_gone(process: &Process) -> bool {
    matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

fn refresh_one(sys: &mut System, pid: u32) {
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
}

impl ProcessProbe for SysinfoProbe {
    fn pids(&self) -> Vec<u32> {
        let mut sys = match self.system.lock() {
            Ok(sys) => sys,
            Err(_) => {
                log::error!("Process table lock poisoned, returning empty table");
                return Vec::new();
            }
        };
        sys.refresh_processes(ProcessesToUpdate::All, true);

        sys.processes().keys().map(|pid| pid.as_u32()).collect()
    }

    fn read(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        let sys = self.lock(pid)?;
        let process = sys
            .process(Pid::from_u32(pid))
            .filter(|p| !is_gone(p))
            .ok_or(ProbeError::NoSuchProcess { pid })?;

        Ok(ProcessRecord::new(pid, process.name().to_string_lossy()))
    }

    fn resolve(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        let mut sys = self.lock(pid)?;
        refresh_one(&mut sys, pid);

        let process = sys
            .process(Pid::from_u32(pid))
            .filter(|p| !is_gone(p))
            .ok_or(ProbeError::NoSuchProcess { pid })?;

        Ok(ProcessRecord::new(pid, process.name().to_string_lossy()))
    }

    fn terminate(&self, pid: u32) -> Result<(), ProbeError> {
        let mut sys = self.lock(pid)?;
        refresh_one(&mut sys, pid);

        let killed = {
            let process = sys
                .process(Pid::from_u32(pid))
                .filter(|p| !is_gone(p))
                .ok_or(ProbeError::NoSuchProcess { pid })?;
            // 不支持 SIGKILL 的平台退回默认的 kill
            process
                .kill_with(Signal::Kill)
                .unwrap_or_else(|| process.kill())
        };

        if killed {
            return Ok(());
        }

        // 发送失败：进程仍在说明没有权限，否则是刚好退出了
        refresh_one(&mut sys, pid);
        match sys.process(Pid::from_u32(pid)) {
            Some(p) if !is_gone(p) => Err(ProbeError::AccessDenied { pid }),
            _ => Err(ProbeError::NoSuchProcess { pid }),
        }
    }

    fn open_usage(&self, pid: u32) -> Result<Box<dyn UsageReader>, ProbeError> {
        Ok(Box::new(SysinfoUsageReader::new(pid)?))
    }
}

/// 单进程读取器，每个会话独占一个 `System`
pub struct SysinfoUsageReader {
    pid: Pid,
    system: System,
    total_memory: u64,
}

impl SysinfoUsageReader {
    pub fn new(pid: u32) -> Result<Self, ProbeError> {
        let mut system = System::new();
        system.refresh_memory();

        let mut reader = Self {
            pid: Pid::from_u32(pid),
            total_memory: system.total_memory(),
            system,
        };
        // 第一次刷新只建立 CPU 基线
        reader.refresh()?;
        Ok(reader)
    }

    fn refresh(&mut self) -> Result<&Process, ProbeError> {
        let pid = self.pid.as_u32();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        self.system
            .process(self.pid)
            .filter(|p| !is_gone(p))
            .ok_or(ProbeError::NoSuchProcess { pid })
    }
}

impl UsageReader for SysinfoUsageReader {
    fn read_usage(&mut self) -> Result<Usage, ProbeError> {
        let total_memory = self.total_memory;
        let process = self.refresh()?;

        Ok(Usage {
            cpu_percent: process.cpu_usage() as f64,
            memory_percent: if total_memory > 0 {
                (process.memory() as f64 / total_memory as f64) * 100.0
            } else {
                0.0
            },
        })
    }
}
