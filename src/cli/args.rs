use clap::Parser;
use std::time::Duration;

use crate::models::ViewConfig;
use crate::services::sample_buffer::MAX_CAPACITY;
use crate::services::SamplerConfig;

/// procwatch - 进程列表、结束进程与实时 CPU/内存曲线
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// 监听端口
    #[arg(short, long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// 监听地址
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "127.0.0.1")]
    pub address: String,

    /// 采样调度间隔 (毫秒)
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_interval_ms: u64,

    /// 每个会话保留的采样点数量
    #[arg(long, env = "BUFFER_CAPACITY", default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1..=MAX_CAPACITY as u64))]
    pub buffer_capacity: u64,

    /// 曲线 X 轴窗口 (秒)
    #[arg(long, env = "WINDOW_SECS", default_value_t = 5.0)]
    pub window_secs: f64,

    /// Y 轴上限的最小值
    #[arg(long, env = "RANGE_FLOOR", default_value_t = 2.0)]
    pub range_floor: f64,
}

impl CommandArgs {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            capacity: usize::try_from(self.buffer_capacity).unwrap_or(MAX_CAPACITY),
            view: ViewConfig {
                window_secs: self.window_secs,
                range_floor: self.range_floor,
            },
        }
    }
}
