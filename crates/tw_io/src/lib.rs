// crates/tw_io/src/lib.rs

//! TerraWind IO 层
//!
//! 提供时间检查点的定长二进制记录读写。
//!
//! # 模块
//!
//! - [`checkpoint`]: 时间检查点记录（定长 20 字节，小端，无文件头）
//! - [`error`]: IO 错误类型
//!
//! 场数据、统计与可视化输出属于外部协作者，不在本层范围内。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod error;

// 重导出常用类型
pub use checkpoint::{TimeRecord, RECORD_SIZE};
pub use error::{IoError, IoResult};
