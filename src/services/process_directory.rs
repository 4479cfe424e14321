use crate::models::{DisplayEntry, ProcessRecord};
use crate::services::probe::ProcessProbe;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// 进程名称过滤器：不区分大小写的子串匹配，空串匹配全部
pub enum NameFilter {
    All,
    Pattern(Regex),
    // 超出正则大小限制时退回小写比较
    Lowercase(String),
}

impl NameFilter {
    pub fn new(pattern: &str) -> Self {
        if pattern.is_empty() {
            return NameFilter::All;
        }

        match RegexBuilder::new(&regex::escape(pattern))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => NameFilter::Pattern(regex),
            Err(e) => {
                log::warn!("Failed to compile name filter: {}, using lowercase match", e);
                NameFilter::Lowercase(pattern.to_lowercase())
            }
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Pattern(regex) => regex.is_match(name),
            NameFilter::Lowercase(needle) => name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// 进程目录：枚举进程表并按名称过滤
#[derive(Clone)]
pub struct ProcessDirectory {
    probe: Arc<dyn ProcessProbe>,
}

impl ProcessDirectory {
    pub fn new(probe: Arc<dyn ProcessProbe>) -> Self {
        Self { probe }
    }

    /// 遍历一次进程表，读取失败的条目（已退出、无权限）直接跳过
    pub fn records(&self, filter: &str) -> Vec<ProcessRecord> {
        let filter = NameFilter::new(filter);
        let pids = self.probe.pids();

        let mut records = Vec::with_capacity(pids.len());
        let mut skipped = 0usize;

        for pid in pids {
            match self.probe.read(pid) {
                Ok(record) => {
                    if filter.matches(&record.name) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    log::trace!("Skipping process: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {} unreadable processes during enumeration", skipped);
        }

        records
    }

    pub fn enumerate(&self, filter: &str) -> Vec<DisplayEntry> {
        self.records(filter)
            .iter()
            .map(ProcessRecord::display_entry)
            .collect()
    }
}
