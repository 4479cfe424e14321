//! 测试用的可控进程表

use crate::models::{ProcessRecord, Usage};
use crate::services::probe::{ProbeError, ProcessProbe, UsageReader};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Readable,
    Denied,
    /// 出现在进程表里，但读取时已经退出
    Vanished,
}

struct FakeProcess {
    name: String,
    access: Access,
    killable: bool,
    usage: VecDeque<Result<Usage, ProbeError>>,
}

#[derive(Default)]
struct Table {
    processes: BTreeMap<u32, FakeProcess>,
    killed: Vec<u32>,
}

#[derive(Clone, Default)]
pub struct FakeProbe {
    table: Arc<Mutex<Table>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processes(entries: &[(u32, &str)]) -> Self {
        let probe = Self::new();
        for (pid, name) in entries {
            probe.insert(*pid, name);
        }
        probe
    }

    pub fn insert(&self, pid: u32, name: &str) {
        self.insert_with(pid, name, Access::Readable);
    }

    pub fn insert_with(&self, pid: u32, name: &str, access: Access) {
        self.table.lock().unwrap().processes.insert(
            pid,
            FakeProcess {
                name: name.to_string(),
                access,
                killable: true,
                usage: VecDeque::new(),
            },
        );
    }

    pub fn remove(&self, pid: u32) {
        self.table.lock().unwrap().processes.remove(&pid);
    }

    pub fn set_access(&self, pid: u32, access: Access) {
        if let Some(p) = self.table.lock().unwrap().processes.get_mut(&pid) {
            p.access = access;
        }
    }

    pub fn set_killable(&self, pid: u32, killable: bool) {
        if let Some(p) = self.table.lock().unwrap().processes.get_mut(&pid) {
            p.killable = killable;
        }
    }

    /// 预置后续读数；读完后返回固定的 1% / 1%
    pub fn push_usage(&self, pid: u32, reading: Result<Usage, ProbeError>) {
        if let Some(p) = self.table.lock().unwrap().processes.get_mut(&pid) {
            p.usage.push_back(reading);
        }
    }

    pub fn killed(&self) -> Vec<u32> {
        self.table.lock().unwrap().killed.clone()
    }
}

fn check(table: &Table, pid: u32) -> Result<&FakeProcess, ProbeError> {
    let process = table
        .processes
        .get(&pid)
        .ok_or(ProbeError::NoSuchProcess { pid })?;
    match process.access {
        Access::Readable => Ok(process),
        Access::Denied => Err(ProbeError::AccessDenied { pid }),
        Access::Vanished => Err(ProbeError::NoSuchProcess { pid }),
    }
}

impl ProcessProbe for FakeProbe {
    fn pids(&self) -> Vec<u32> {
        self.table.lock().unwrap().processes.keys().copied().collect()
    }

    fn read(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        let table = self.table.lock().unwrap();
        let process = check(&table, pid)?;
        Ok(ProcessRecord::new(pid, process.name.clone()))
    }

    fn resolve(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        self.read(pid)
    }

    fn terminate(&self, pid: u32) -> Result<(), ProbeError> {
        let mut table = self.table.lock().unwrap();
        if !check(&table, pid)?.killable {
            return Err(ProbeError::Other {
                pid,
                reason: "operation not permitted".to_string(),
            });
        }
        table.processes.remove(&pid);
        table.killed.push(pid);
        Ok(())
    }

    fn open_usage(&self, pid: u32) -> Result<Box<dyn UsageReader>, ProbeError> {
        check(&self.table.lock().unwrap(), pid)?;
        Ok(Box::new(FakeUsageReader {
            pid,
            table: Arc::clone(&self.table),
        }))
    }
}

struct FakeUsageReader {
    pid: u32,
    table: Arc<Mutex<Table>>,
}

impl UsageReader for FakeUsageReader {
    fn read_usage(&mut self) -> Result<Usage, ProbeError> {
        let mut table = self.table.lock().unwrap();
        check(&table, self.pid)?;

        let process = table
            .processes
            .get_mut(&self.pid)
            .ok_or(ProbeError::NoSuchProcess { pid: self.pid })?;
        process.usage.pop_front().unwrap_or(Ok(Usage {
            cpu_percent: 1.0,
            memory_percent: 1.0,
        }))
    }
}
