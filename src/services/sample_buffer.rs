use crate::models::{Sample, Series, SeriesView, ViewConfig};
use std::collections::VecDeque;

/// 默认保留的采样点数量
pub const DEFAULT_CAPACITY: usize = 1000;

/// 单个会话最多保留的采样点数量
pub const MAX_CAPACITY: usize = 100_000;

/// 固定容量的滑动窗口，满了之后淘汰最旧的采样
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        // 随采样增长，不按容量预分配
        Self {
            samples: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn append(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn as_series(&self) -> Series {
        let n = self.samples.len();
        let mut series = Series {
            times: Vec::with_capacity(n),
            cpu: Vec::with_capacity(n),
            mem: Vec::with_capacity(n),
        };
        for s in &self.samples {
            series.times.push(s.t);
            series.cpu.push(s.cpu);
            series.mem.push(s.mem);
        }
        series
    }

    pub fn view(&self, pid: u32, config: &ViewConfig) -> SeriesView {
        SeriesView::new(pid, self.as_series(), config)
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Sample {
        Sample {
            t: i as f64 * 0.01,
            cpu: i as f64,
            mem: i as f64 / 2.0,
        }
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut buffer = SampleBuffer::new(3);
        for cpu in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.append(Sample { t: cpu, cpu, mem: 0.0 });
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_series().cpu, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_keeps_last_capacity_samples_in_order() {
        let mut buffer = SampleBuffer::default();
        let total = DEFAULT_CAPACITY + 250;
        for i in 0..total {
            buffer.append(sample(i));
            assert!(buffer.len() <= DEFAULT_CAPACITY);
        }

        let series = buffer.as_series();
        assert_eq!(series.len(), DEFAULT_CAPACITY);
        assert_eq!(series.cpu.first(), Some(&250.0));
        assert_eq!(series.cpu.last(), Some(&((total - 1) as f64)));
        assert!(series.times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_below_capacity_keeps_everything() {
        let mut buffer = SampleBuffer::new(10);
        for i in 0..4 {
            buffer.append(sample(i));
        }
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.as_series().cpu.last(), Some(&3.0));
    }

    #[test]
    fn test_as_series_does_not_mutate() {
        let mut buffer = SampleBuffer::new(5);
        for i in 0..3 {
            buffer.append(sample(i));
        }

        let first = buffer.as_series();
        let second = buffer.as_series();
        assert_eq!(first, second);
        assert_eq!(first.times.len(), first.cpu.len());
        assert_eq!(first.cpu.len(), first.mem.len());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = SampleBuffer::new(0);
        buffer.append(sample(1));
        buffer.append(sample(2));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.as_series().cpu, vec![2.0]);
    }

    #[test]
    fn test_huge_capacity_is_bounded() {
        let mut buffer = SampleBuffer::new(1usize << 40);
        assert_eq!(buffer.capacity(), MAX_CAPACITY);
        assert!(buffer.is_empty());

        buffer.append(sample(1));
        assert_eq!(buffer.len(), 1);
    }
}
