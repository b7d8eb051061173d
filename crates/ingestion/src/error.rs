//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 事件本身不是合法的通知信封
    #[error("malformed notification event: {message}")]
    MalformedEvent {
        /// 错误消息
        message: String,
    },

    /// 信封内的消息体无法解析
    #[error("malformed notification message {message_id}: {message}")]
    MalformedMessage {
        /// 消息 ID (缺失时为 "-")
        message_id: String,
        /// 错误消息
        message: String,
    },

    /// 消息体中没有对象记录
    #[error("notification message {message_id} carries no object record")]
    MissingObject {
        /// 消息 ID (缺失时为 "-")
        message_id: String,
    },

    /// 对象内容在某行读取失败
    #[error("read failed after line {line}: {message}")]
    ReadFailed {
        /// 已成功读取的行数
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 通知输入流读取失败
    #[error("notification feed error: {0}")]
    Feed(#[from] std::io::Error),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
