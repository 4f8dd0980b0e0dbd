// crates/tw_physics/src/timeloop/mod.rs

//! 时间积分层
//!
//! 显式低存储 Runge-Kutta 时间积分器及其配套机构：
//!
//! - [`tableau`]: RK3/RK4 字面系数表、阶数选择与子步状态机
//! - [`integrator`]: 定点规范时间、自适应步长限制、检查点与
//!   时间插值辅助
//!
//! 规范时间以无符号整数原子时间单位保存（浮点秒乘以 1e9 缩放），
//! 保证检查点时刻精确落在 IO 时间精度单位的整数倍上；
//! 浮点镜像仅供数值内核使用。

pub mod integrator;
pub mod tableau;

use thiserror::Error;

use tw_config::ConfigError;

pub use integrator::{InterpolationFactors, Timeloop};
pub use tableau::{RkOrder, SubstepScheduler, RK3_CA, RK3_CB, RK4_CA, RK4_CB};

// ============================================================
// 错误类型
// ============================================================

/// 时间积分器错误
///
/// 配置类错误在构造时检出；检查点错误经错误计数广播同步后
/// 由所有进程一致抛出。
#[derive(Error, Debug)]
pub enum TimeloopError {
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 非法的 RK 阶数
    #[error("\"{order}\" 不是合法的 rkorder 取值, 仅支持 3 或 4")]
    IllegalRkOrder {
        /// 配置给出的阶数
        order: u8,
    },

    /// 起始/保存时间与 IO 精度不对齐
    #[error("starttime 或 savetime 不是 iotimeprec 精度单位的精确倍数")]
    IoTimeMisaligned,

    /// IO 精度小于整数时间单位
    #[error("iotimeprec 对应的精度单位小于时间推进精度, 无法表示为整数时间单位")]
    IoPrecisionUnderflow,

    /// 步长取整后为零
    #[error("所需时间步长小于时间推进精度 {precision:e} 秒")]
    StepUnderflow {
        /// 整数时间单位对应的秒数
        precision: f64,
    },

    /// 检查点保存失败（已全局同步）
    #[error("检查点保存失败, 所有进程一致中止")]
    CheckpointSaveFailed,

    /// 检查点加载失败（已全局同步）
    #[error("检查点加载失败, 所有进程一致中止")]
    CheckpointLoadFailed,
}

/// 时间积分结果类型
pub type TimeloopResult<T> = Result<T, TimeloopError>;
