use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    // 贪婪匹配名称，PID 只取末尾的后缀
    static ref DISPLAY_ENTRY_RE: Regex = Regex::new(r"(?s)^(.*) \(PID: (\d+)\)$").unwrap();
}

/// 进程快照记录
///
/// 只在产生它的那一次枚举中有效，PID 会被操作系统复用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    /// 进程 ID
    pub pid: u32,
    /// 进程名称
    pub name: String,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }

    pub fn display_entry(&self) -> DisplayEntry {
        DisplayEntry {
            pid: self.pid,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayEntryError {
    #[error("no process selected")]
    Empty,

    #[error("malformed process entry: {0:?}")]
    Malformed(String),
}

/// 列表中展示的进程条目，格式为 `<name> (PID: <pid>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub pid: u32,
    pub name: String,
}

impl fmt::Display for DisplayEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

impl FromStr for DisplayEntry {
    type Err = DisplayEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DisplayEntryError::Empty);
        }

        let caps = DISPLAY_ENTRY_RE
            .captures(s)
            .ok_or_else(|| DisplayEntryError::Malformed(s.to_string()))?;

        // 超出 u32 范围同样视为格式错误
        let pid = caps[2]
            .parse::<u32>()
            .map_err(|_| DisplayEntryError::Malformed(s.to_string()))?;

        Ok(Self {
            pid,
            name: caps[1].to_string(),
        })
    }
}

impl Serialize for DisplayEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let record = ProcessRecord::new(1003, "bash");
        assert_eq!(record.display_entry().to_string(), "bash (PID: 1003)");
    }

    #[test]
    fn test_parse_recovers_record() {
        let record = ProcessRecord::new(1002, "Chrome Helper");
        let parsed: DisplayEntry = record.display_entry().to_string().parse().unwrap();
        assert_eq!(ProcessRecord::new(parsed.pid, parsed.name), record);
    }

    #[test]
    fn test_parse_name_with_embedded_marker() {
        // 名称里带 " (PID: " 也不会误解析
        let record = ProcessRecord::new(42, "evil (PID: 7) name");
        let parsed: DisplayEntry = record.display_entry().to_string().parse().unwrap();
        assert_eq!(parsed.pid, 42);
        assert_eq!(parsed.name, "evil (PID: 7) name");
    }

    #[test]
    fn test_parse_empty_name() {
        let parsed: DisplayEntry = " (PID: 5)".parse().unwrap();
        assert_eq!(parsed.pid, 5);
        assert_eq!(parsed.name, "");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<DisplayEntry>(), Err(DisplayEntryError::Empty));
        assert_eq!("   ".parse::<DisplayEntry>(), Err(DisplayEntryError::Empty));

        for bad in [
            "bash",
            "bash (PID: )",
            "bash (PID: abc)",
            "bash (PID: -1)",
            "bash (PID: 12) ",
            "bash (PID: 12)x",
            "bash(PID: 12)",
            "bash (PID: 99999999999)",
        ] {
            assert!(
                matches!(bad.parse::<DisplayEntry>(), Err(DisplayEntryError::Malformed(_))),
                "should reject {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_serialize_as_string() {
        let entry = ProcessRecord::new(1, "init").display_entry();
        assert_eq!(serde_json::to_string(&entry).unwrap(), "\"init (PID: 1)\"");
    }
}
