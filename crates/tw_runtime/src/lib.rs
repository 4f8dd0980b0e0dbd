// crates/tw_runtime/src/lib.rs

//! TerraWind Runtime Layer (Layer 2)
//!
//! 运行时抽象层，提供求解器核心所依赖的协作者接口：
//!
//! - [`grid`]: 结构化交错网格的索引范围、步长与坐标数组
//! - [`fields`]: 预报场存储（场值数组 + 倾向数组）
//! - [`coordinator`]: 进程协调抽象（协调进程判定、标量广播、墙钟预算）
//!
//! # 职责边界
//!
//! 网格划分、度量计算与真正的分布式通信由外部协作者负责，
//! 本层只固定它们与求解器核心之间的窄接口。
//! 核心内部不存在异步挂起；唯一的阻塞点是协调接口上的集合通信，
//! 所有进程必须以相同顺序到达这些集合点。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod fields;
pub mod grid;

// 重导出常用类型
pub use coordinator::{ProcessCoordinator, SingleProcess};
pub use fields::{FieldStore, PrognosticField};
pub use grid::{StaggerLocation, StructuredGrid};
