use serde::Serialize;

/// 单次采样结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// 距采样开始的秒数
    pub t: f64,
    /// CPU 使用率 (百分比)
    pub cpu: f64,
    /// 内存使用率 (百分比，占物理内存)
    pub mem: f64,
}

/// 进程资源占用的瞬时读数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Usage {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// 三条等长的平行序列，按时间排序
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    pub times: Vec<f64>,
    pub cpu: Vec<f64>,
    pub mem: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// 绘图用的坐标范围参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    /// X 轴滑动窗口长度 (秒)
    pub window_secs: f64,
    /// Y 轴上限的最小值
    pub range_floor: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_secs: 5.0,
            range_floor: 2.0,
        }
    }
}

/// 供展示层重绘的只读视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub pid: u32,
    #[serde(flatten)]
    pub series: Series,
    pub x_range: (f64, f64),
    pub cpu_range: (f64, f64),
    pub mem_range: (f64, f64),
}

impl SeriesView {
    pub fn new(pid: u32, series: Series, config: &ViewConfig) -> Self {
        let latest = series.times.last().copied().unwrap_or(0.0);
        let window = config.window_secs.max(f64::EPSILON);
        let x_range = if latest < window {
            (0.0, window)
        } else {
            (latest - window, latest)
        };

        let cpu_range = (0.0, value_ceiling(&series.cpu, config.range_floor));
        let mem_range = (0.0, value_ceiling(&series.mem, config.range_floor));

        Self {
            pid,
            series,
            x_range,
            cpu_range,
            mem_range,
        }
    }
}

/// `max(floor, 最大观测值)`，空序列或全为非正数时返回 floor
fn value_ceiling(values: &[f64], floor: f64) -> f64 {
    let floor = if floor > 0.0 { floor } else { 1.0 };
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(floor, f64::max)
}
