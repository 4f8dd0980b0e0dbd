// crates/tw_foundation/src/lib.rs

//! TerraWind Foundation Layer (Layer 1)
//!
//! 零依赖基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `TwError` / `TwResult`
//! - [`constants`]: 数值常量（大数哨兵、容差等）
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: tw_cli        ─> 命令行入口
//! Layer 4: tw_config     ─> TimeConfig, ImmersedBoundaryConfig
//! Layer 3: tw_physics    ─> Timeloop, ImmersedBoundary
//! Layer 2: tw_runtime    ─> StructuredGrid, FieldStore, ProcessCoordinator
//! Layer 1: tw_foundation ─> TwError, 常量 (本层)
//! ```
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror
//! 2. **层次化错误**: 基础层只定义核心错误，物理相关错误在 tw_physics 中定义

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod error;

// 重导出常用类型
pub use error::{TwError, TwResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::constants::{DBIG, DSMALL};
    pub use crate::error::{TwError, TwResult};
    pub use crate::{ensure, require};
}

/// 条件检查宏：条件不满足时提前返回错误
///
/// # 示例
///
/// ```
/// use tw_foundation::{ensure, TwError, TwResult};
///
/// fn check(value: i32) -> TwResult<()> {
///     ensure!(value > 0, TwError::invalid_input("value must be positive"));
///     Ok(())
/// }
///
/// assert!(check(1).is_ok());
/// assert!(check(-1).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// Option 解包宏：值缺失时提前返回错误
///
/// # 示例
///
/// ```
/// use tw_foundation::{require, TwError, TwResult};
///
/// fn get(opt: Option<i32>) -> TwResult<i32> {
///     let v = require!(opt, TwError::missing_config("value"));
///     Ok(v)
/// }
///
/// assert_eq!(get(Some(42)).unwrap(), 42);
/// assert!(get(None).is_err());
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}
