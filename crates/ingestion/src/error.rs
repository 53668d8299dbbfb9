//! Ingestion 错误类型

use thiserror::Error;

/// 入队失败
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// 队列已满且溢出策略为 reject
    #[error("intake queue full (capacity {capacity})")]
    Full {
        /// 队列容量
        capacity: usize,
    },

    /// 队列已关闭 (正在停机)
    #[error("intake queue closed")]
    Closed,
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, EnqueueError>;
