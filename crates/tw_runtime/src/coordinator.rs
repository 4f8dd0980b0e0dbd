// crates/tw_runtime/src/coordinator.rs

//! 进程协调抽象
//!
//! 本模块定义求解器核心与分布式协作者之间的窄接口：
//! - ProcessCoordinator: 协调进程判定、标量广播与墙钟预算查询
//! - SingleProcess: 单进程实现（广播为空操作）
//!
//! # 集合通信契约
//!
//! 核心内的集合点只有三处：检查点错误码广播、检查点字段广播、
//! 墙钟预算查询。所有进程必须以相同顺序、相同迭代到达这些点；
//! 任何分歧（如仅一个进程打开文件失败）通过先广播错误计数再统一
//! 中止来避免死锁。

use std::time::{Duration, Instant};

// ============================================================
// 协调接口
// ============================================================

/// 进程协调接口
///
/// 真正的分布式实现（如 MPI 绑定）由外部协作者提供；
/// 核心只依赖此 trait。广播语义：调用后所有进程内 `value`
/// 等于协调进程的取值。
pub trait ProcessCoordinator {
    /// 本进程是否为协调进程（负责检查点文件读写）
    fn is_coordinator(&self) -> bool;

    /// 本进程编号
    fn rank(&self) -> usize;

    /// 进程总数
    fn num_processes(&self) -> usize;

    /// 广播 u64 标量
    fn broadcast_u64(&self, value: &mut u64);

    /// 广播 i32 标量
    fn broadcast_i32(&self, value: &mut i32);

    /// 广播 u32 标量（错误计数）
    fn broadcast_u32(&self, value: &mut u32);

    /// 墙钟预算是否即将耗尽
    ///
    /// 返回 true 时积分器会将步长对齐到最近的 IO 精度边界，
    /// 以便保存后整齐停机。实现应保证所有进程返回一致结果
    /// （集合语义）。
    fn at_wall_clock_limit(&self) -> bool;
}

// ============================================================
// 单进程实现
// ============================================================

/// 墙钟预算的安全系数：超过预算的 95% 即视为到达限制
const WALL_CLOCK_SAFETY: f64 = 0.95;

/// 单进程协调器
///
/// 广播为空操作；墙钟预算基于进程启动时刻计算。
#[derive(Debug)]
pub struct SingleProcess {
    start: Instant,
    wall_clock_budget: Option<Duration>,
}

impl SingleProcess {
    /// 创建无墙钟预算的协调器
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            wall_clock_budget: None,
        }
    }

    /// 创建带墙钟预算的协调器
    ///
    /// # 参数
    /// - `budget_seconds`: 允许的墙钟运行时长 [s]
    pub fn with_wall_clock_budget(budget_seconds: f64) -> Self {
        Self {
            start: Instant::now(),
            wall_clock_budget: Some(Duration::from_secs_f64(budget_seconds)),
        }
    }

    /// 已消耗的墙钟时间 [s]
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for SingleProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCoordinator for SingleProcess {
    fn is_coordinator(&self) -> bool {
        true
    }

    fn rank(&self) -> usize {
        0
    }

    fn num_processes(&self) -> usize {
        1
    }

    fn broadcast_u64(&self, _value: &mut u64) {}

    fn broadcast_i32(&self, _value: &mut i32) {}

    fn broadcast_u32(&self, _value: &mut u32) {}

    fn at_wall_clock_limit(&self) -> bool {
        match self.wall_clock_budget {
            Some(budget) => self.start.elapsed().as_secs_f64() >= budget.as_secs_f64() * WALL_CLOCK_SAFETY,
            None => false,
        }
    }
}

// ============================================================
// 测试
// ============================================================
