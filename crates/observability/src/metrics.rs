//! Relay 指标收集模块
//!
//! 通知处理与记录分发的运行指标：Prometheus 计数器 + 内存聚合摘要。

use contracts::DispatchSummary;
use metrics::{counter, histogram};

/// 单个通知的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    /// 已完成分发 (不代表所有记录都成功)
    Dispatched,
    /// 信封无法解析，已跳过
    Malformed,
    /// 对象获取失败，已跳过
    RetrievalFailed,
}

impl NotificationStatus {
    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Malformed => "malformed",
            Self::RetrievalFailed => "retrieval_failed",
        }
    }
}

/// 记录通知处理结果
pub fn record_notification(status: NotificationStatus) {
    counter!(
        "line_relay_notifications_total",
        "status" => status.as_str()
    )
    .increment(1);
}

/// 记录单条记录的分发结果
pub fn record_dispatch_outcome(outcome: &'static str) {
    counter!("line_relay_dispatch_total", "outcome" => outcome).increment(1);
}

/// 记录一次 fan-out 的汇总
pub fn record_dispatch_summary(summary: &DispatchSummary) {
    counter!("line_relay_records_total").increment(summary.records as u64);
    counter!("line_relay_batches_total").increment(summary.batches as u64);
    if summary.lost_batches > 0 {
        counter!("line_relay_batches_lost_total").increment(summary.lost_batches as u64);
    }
    histogram!("line_relay_fanout_duration_ms").record(summary.elapsed.as_secs_f64() * 1000.0);
}

/// 运行期指标聚合器
///
/// 在内存中聚合所有通知的结果，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// 已分发的通知数
    pub notifications: u64,

    /// 被跳过的通知数 (信封错误 / 获取失败)
    pub skipped_notifications: u64,

    /// 分发的记录总数
    pub records: u64,

    /// 成功送达数 (含解码失败但已送达)
    pub delivered: u64,

    /// 解码失败数
    pub decode_failed: u64,

    /// 传输失败数
    pub transport_failed: u64,

    /// 非 200 状态数
    pub status_failed: u64,

    /// worker 异常退出而未汇报的批次数
    pub lost_batches: u64,

    /// 每次 fan-out 的耗时统计 (毫秒)
    pub fanout_ms: RunningStats,
}

impl RelayMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一次 fan-out 的结果
    pub fn update(&mut self, summary: &DispatchSummary) {
        self.notifications += 1;
        self.records += summary.records as u64;
        self.delivered += (summary.delivered + summary.decode_failed) as u64;
        self.decode_failed += summary.decode_failed as u64;
        self.transport_failed += summary.transport_failed as u64;
        self.status_failed += summary.status_failed as u64;
        self.lost_batches += summary.lost_batches as u64;
        self.fanout_ms.push(summary.elapsed.as_secs_f64() * 1000.0);
    }

    /// 记录一次被跳过的通知
    pub fn skip(&mut self) {
        self.skipped_notifications += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RelaySummary {
        RelaySummary {
            notifications: self.notifications,
            skipped_notifications: self.skipped_notifications,
            records: self.records,
            delivered: self.delivered,
            decode_failed: self.decode_failed,
            failed: self.transport_failed + self.status_failed,
            failure_rate: if self.records > 0 {
                (self.transport_failed + self.status_failed) as f64 / self.records as f64 * 100.0
            } else {
                0.0
            },
            lost_batches: self.lost_batches,
            fanout_ms: StatsSummary::from(&self.fanout_ms),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub notifications: u64,
    pub skipped_notifications: u64,
    pub records: u64,
    pub delivered: u64,
    pub decode_failed: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub lost_batches: u64,
    pub fanout_ms: StatsSummary,
}

impl std::fmt::Display for RelaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Summary ===")?;
        writeln!(
            f,
            "Notifications: {} dispatched, {} skipped",
            self.notifications, self.skipped_notifications
        )?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(
            f,
            "Delivered: {} ({} without a decodable body)",
            self.delivered, self.decode_failed
        )?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Lost batches: {}", self.lost_batches)?;
        writeln!(f, "Fan-out time (ms): {}", self.fanout_ms)?;
        Ok(())
    }
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
}
