// crates/tw_foundation/src/constants.rs

//! 数值常量
//!
//! 提供求解器各处使用的哨兵值与容差常量。

/// 大数哨兵
///
/// 用作"无限制"的时间步长上限等默认值。选择 1e9 而非 f64::MAX，
/// 保证乘以时间定点缩放因子 (1e9) 后仍可无损放入 u64。
pub const DBIG: f64 = 1.0e9;

/// 小数哨兵
pub const DSMALL: f64 = 1.0e-9;
