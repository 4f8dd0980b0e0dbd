// crates/tw_physics/src/timeloop/tableau.rs

//! 低存储 Runge-Kutta 系数表
//!
//! 两套显式低存储格式的字面系数，不做推导：
//!
//! - 三级三阶 (Williamson 型)：级内重置系数 cA 与步长份额系数 cB
//! - 五级四阶 (Carpenter-Kennedy)：同上
//!
//! 低存储格式跨级复用同一倾向缓冲，按
//! `a += cB[s]·dt·at; at *= cA[s+1]` 推进；cA[0] = 0 使第 0 级
//! 完成倾向的完全重置。

use super::TimeloopError;

/// RK3 级内重置系数
pub const RK3_CA: [f64; 3] = [0.0, -5.0 / 9.0, -153.0 / 128.0];

/// RK3 步长份额系数
pub const RK3_CB: [f64; 3] = [1.0 / 3.0, 15.0 / 16.0, 8.0 / 15.0];

/// RK4(5) 级内重置系数
pub const RK4_CA: [f64; 5] = [
    0.0,
    -567301805773.0 / 1357537059087.0,
    -2404267990393.0 / 2016746695238.0,
    -3550918686646.0 / 2091501179385.0,
    -1275806237668.0 / 842570457699.0,
];

/// RK4(5) 步长份额系数
pub const RK4_CB: [f64; 5] = [
    1432997174477.0 / 9575080441755.0,
    5161836677717.0 / 13612068292357.0,
    1720146321549.0 / 2090206949498.0,
    3134564353537.0 / 4481467310338.0,
    2277821191437.0 / 14882151754819.0,
];

// ============================================================
// 阶数选择
// ============================================================

/// Runge-Kutta 阶数
///
/// 每次运行只激活一种阶数；其余整数值在构造时即为致命配置错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RkOrder {
    /// 三级三阶低存储格式
    Rk3,
    /// 五级四阶低存储格式
    Rk4,
}

impl RkOrder {
    /// 从配置的整数值转换
    pub fn from_config(order: u8) -> Result<Self, TimeloopError> {
        match order {
            3 => Ok(Self::Rk3),
            4 => Ok(Self::Rk4),
            other => Err(TimeloopError::IllegalRkOrder { order: other }),
        }
    }

    /// 精度阶数
    #[inline]
    pub fn order(&self) -> u8 {
        match self {
            Self::Rk3 => 3,
            Self::Rk4 => 4,
        }
    }

    /// 级数
    #[inline]
    pub fn stages(&self) -> usize {
        match self {
            Self::Rk3 => 3,
            Self::Rk4 => 5,
        }
    }

    /// 级内重置系数表
    #[inline]
    pub fn ca(&self) -> &'static [f64] {
        match self {
            Self::Rk3 => &RK3_CA,
            Self::Rk4 => &RK4_CA,
        }
    }

    /// 步长份额系数表
    #[inline]
    pub fn cb(&self) -> &'static [f64] {
        match self {
            Self::Rk3 => &RK3_CB,
            Self::Rk4 => &RK4_CB,
        }
    }
}

impl std::fmt::Display for RkOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rk3 => write!(f, "RK3"),
            Self::Rk4 => write!(f, "RK4"),
        }
    }
}

// ============================================================
// 子步状态机
// ============================================================

/// 子步调度器
///
/// 跟踪当前活动的 RK 级，并为所有"每整步一次"的逻辑
/// （输出、保存、统计、时间推进）提供门控。
#[derive(Debug, Clone, Copy)]
pub struct SubstepScheduler {
    substep: usize,
    stages: usize,
}

impl SubstepScheduler {
    /// 创建调度器
    pub fn new(order: RkOrder) -> Self {
        Self {
            substep: 0,
            stages: order.stages(),
        }
    }

    /// 当前级索引
    #[inline]
    pub fn substep(&self) -> usize {
        self.substep
    }

    /// 下一级索引（模级数循环）
    #[inline]
    pub fn next_substep(&self) -> usize {
        (self.substep + 1) % self.stages
    }

    /// 是否处于子步当中
    ///
    /// 级 0 表示整步边界：所有"每整步一次"的决策都以此为门。
    #[inline]
    pub fn in_substep(&self) -> bool {
        self.substep > 0
    }

    /// 推进到下一级
    ///
    /// 级索引回到 0 时恰好完成一个整步。
    #[inline]
    pub fn advance(&mut self) {
        self.substep = (self.substep + 1) % self.stages;
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rkorder_from_config() {
        assert_eq!(RkOrder::from_config(3).unwrap(), RkOrder::Rk3);
        assert_eq!(RkOrder::from_config(4).unwrap(), RkOrder::Rk4);
        assert!(matches!(
            RkOrder::from_config(2),
            Err(TimeloopError::IllegalRkOrder { order: 2 })
        ));
        assert!(RkOrder::from_config(5).is_err());
    }

    #[test]
    fn test_stage_zero_resets_tendency() {
        // cA[0] = 0 充当倾向的完全重置
        assert_eq!(RK3_CA[0], 0.0);
        assert_eq!(RK4_CA[0], 0.0);
    }

    #[test]
    fn test_consistency_weights_sum_to_one() {
        // 一致性条件：常数倾向经一个完整级循环后恰好积分 dt·f。
        // 对低存储格式等价于有效权重之和为 1。
        for order in [RkOrder::Rk3, RkOrder::Rk4] {
            let ca = order.ca();
            let cb = order.cb();
            let stages = order.stages();

            let mut a = 0.0;
            let mut at = 0.0;
            for s in 0..stages {
                at += 1.0;
                a += cb[s] * at;
                at *= ca[(s + 1) % stages];
            }
            assert!(
                (a - 1.0).abs() < 1e-12,
                "{order} effective weights sum to {a}"
            );
        }
    }

    #[test]
    fn test_scheduler_cycle() {
        let mut scheduler = SubstepScheduler::new(RkOrder::Rk3);
        assert!(!scheduler.in_substep());
        assert_eq!(scheduler.next_substep(), 1);

        scheduler.advance();
        assert!(scheduler.in_substep());
        scheduler.advance();
        assert_eq!(scheduler.substep(), 2);
        scheduler.advance();

        // 完整循环后回到整步边界
        assert_eq!(scheduler.substep(), 0);
        assert!(!scheduler.in_substep());
    }

    #[test]
    fn test_scheduler_five_stages() {
        let mut scheduler = SubstepScheduler::new(RkOrder::Rk4);
        for _ in 0..5 {
            scheduler.advance();
        }
        assert_eq!(scheduler.substep(), 0);
    }
}
