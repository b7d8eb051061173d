//! # Dispatcher
//!
//! 记录分发模块。
//!
//! 负责：
//! - 把记录切分为固定大小的批次 (`partition`)
//! - 每个批次一个 worker，受 `max_concurrency` 限制并发 (`FanOut`)
//! - 单条记录失败只影响自身，不影响同批次或其他批次
//! - 所有 worker 结束后才返回 (`CompletionBarrier`)

pub mod barrier;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod partition;
pub mod senders;
pub mod worker;

pub use barrier::{CompletionBarrier, CompletionGuard};
pub use contracts::{DispatchSummary, RecordSender};
pub use error::DispatcherError;
pub use fanout::{FanOut, FanOutConfig};
pub use metrics::{DispatchMetrics, InFlightGuard, MetricsSnapshot};
pub use partition::{partition, Batch};
pub use senders::{HttpSender, LogSender};
pub use worker::{run_batch, WorkerOptions};
