//! Relay 指标收集模块
//!
//! 通过 `metrics` facade 记录；未安装 recorder 时所有调用均为空操作。

use metrics::{counter, gauge, histogram};

/// 记录收到的事件 (解码成功)
pub fn record_event_received() {
    counter!("relay_events_received_total").increment(1);
}

/// 记录解码失败的请求
pub fn record_decode_error() {
    counter!("relay_decode_errors_total").increment(1);
}

/// 记录被丢弃的事件
///
/// `reason`: `queue_full` / `evicted` / `closed`
pub fn record_event_dropped(reason: &'static str) {
    counter!("relay_events_dropped_total", "reason" => reason).increment(1);
}

/// 记录入口队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("relay_intake_queue_depth").set(depth as f64);
}

/// 记录一次投递结果
///
/// `status`: `delivered` / `rejected` / `failed`
pub fn record_delivery(sink_name: &str, status: &'static str) {
    counter!(
        "relay_deliveries_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录投递耗时
pub fn record_delivery_latency_ms(latency_ms: f64) {
    histogram!("relay_delivery_latency_ms").record(latency_ms);
}

/// 记录映射时被覆盖的 key
pub fn record_key_collision(group: &'static str) {
    counter!("relay_key_collisions_total", "group" => group).increment(1);
}

/// 记录当前并发投递数
pub fn record_in_flight(in_flight: usize) {
    gauge!("relay_in_flight").set(in_flight as f64);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
