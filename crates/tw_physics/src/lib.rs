// crates/tw_physics/src/lib.rs

//! TerraWind 物理核心 (Layer 3)
//!
//! 大气流动求解器中数值上最苛刻的两个子系统：
//!
//! - [`boundary`]: 幽灵单元浸没边界——几何描述、一次性分类与
//!   模板预计算、逐步的值/倾向重构
//! - [`timeloop`]: 显式低存储 Runge-Kutta 时间积分——定点规范
//!   时间、自适应步长限制、检查点与时间插值辅助
//!
//! 两个子系统紧密耦合：浸没边界层在每个子步中、积分器推进状态
//! 之前改写倾向场；而它的"每整步一次"逻辑以积分器的子步状态机
//! 为门控。
//!
//! 离散化算子、压力求解、湍流闭合、网格划分与统计聚合均为外部
//! 协作者，仅通过 `tw_runtime` 的窄接口进入本层。

#![warn(clippy::all)]

pub mod boundary;
pub mod timeloop;

// 重导出常用类型
pub use boundary::{
    BoundaryCondition, BoundaryEnforcer, BoundaryError, BoundaryResult, BoundaryShape,
    CellClass, Dimensionality, ElevationProvider, GhostCell, GhostCellCatalog, ImmersedBoundary,
    Neighbour, TabulatedElevation, WeightMatrix,
};
pub use timeloop::{
    InterpolationFactors, RkOrder, SubstepScheduler, Timeloop, TimeloopError, TimeloopResult,
};
