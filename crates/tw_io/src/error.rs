// crates/tw_io/src/error.rs

//! IO 层错误类型

use std::path::PathBuf;
use thiserror::Error;

/// IO 结果类型
pub type IoResult<T> = Result<T, IoError>;

/// 检查点 IO 错误
///
/// 检查点读写失败是致命错误；多进程下由调用方先广播错误计数
/// 再统一中止，防止在后续集合通信上死锁。
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件创建失败
    #[error("检查点文件创建失败: {path}")]
    Create {
        /// 目标路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 文件不存在
    #[error("检查点文件不存在: {path}")]
    NotFound {
        /// 目标路径
        path: PathBuf,
    },

    /// 文件读取失败
    #[error("检查点文件读取失败: {path}")]
    Read {
        /// 目标路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 记录不完整
    #[error("检查点记录不完整: {path} 期望{expected}字节, 实际{actual}字节")]
    Truncated {
        /// 目标路径
        path: PathBuf,
        /// 期望字节数
        expected: usize,
        /// 实际字节数
        actual: usize,
    },
}
