// crates/tw_physics/src/timeloop/integrator.rs

//! 时间积分器
//!
//! 驱动外层时间循环的核心状态机：
//!
//! - 对所有预报场执行低存储 RK 级内更新；
//! - 持有规范整数时间与浮点镜像；
//! - 自适应步长限制（CFL 外部约束、保存边界、墙钟预算对齐）；
//! - 检查点保存/加载（经协调进程与错误计数广播）；
//! - 时间插值辅助（供外部强迫协作者使用，无状态）。
//!
//! # 定点时间
//!
//! 浮点秒乘以缩放因子 1e9（加 0.5 防舍入）得到无符号整数原子
//! 时间单位。所有保存/输出边界判定只在整数表示上进行，保证
//! 检查点时刻精确对齐；浮点镜像 (time, dt) 由整数值除以缩放
//! 因子重建。

use std::path::Path;
use std::time::Instant;

use tw_config::{RunMode, TimeConfig};
use tw_io::TimeRecord;
use tw_runtime::{FieldStore, ProcessCoordinator, StructuredGrid};

use super::tableau::{RkOrder, SubstepScheduler};
use super::{TimeloopError, TimeloopResult};

// ============================================================
// 时间插值因子
// ============================================================

/// 时间插值的索引与权重
///
/// 由 [`Timeloop::interpolation_factors`] 给出，
/// 值为 `fac0 * v[index0] + fac1 * v[index1]`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationFactors {
    /// 前括号索引
    pub index0: usize,
    /// 后括号索引
    pub index1: usize,
    /// 前括号权重
    pub fac0: f64,
    /// 后括号权重
    pub fac1: f64,
}

// ============================================================
// 时间积分器
// ============================================================

/// 时间积分器
///
/// 规范时间状态的唯一持有者与修改者；检查点保存/恢复逐字节
/// 还原整数时间字段。
#[derive(Debug)]
pub struct Timeloop {
    mode: RunMode,
    rkorder: RkOrder,
    scheduler: SubstepScheduler,
    adaptivestep: bool,
    outputiter: u32,
    running: bool,

    // 浮点镜像
    time: f64,
    dt: f64,

    // 定点时间状态
    ifactor: f64,
    itime: u64,
    istarttime: u64,
    iendtime: u64,
    idt: u64,
    idtmax: u64,
    idtlim: u64,
    isavetime: u64,
    ipostproctime: u64,
    iiotimeprec: u64,
    iotime: u64,
    iteration: i32,

    last_check: Instant,
}

impl Timeloop {
    /// 从配置构造
    ///
    /// 所有致命配置错误（非法 rkorder、起始/保存时间与 IO 精度
    /// 不对齐、步长取整为零）都在此检出。
    pub fn new(config: &TimeConfig, mode: RunMode) -> TimeloopResult<Self> {
        config.validate(mode)?;

        let rkorder = RkOrder::from_config(config.rkorder)?;
        let ifactor = 1.0e9;

        let starttime = config.effective_starttime(mode)?;
        let dt = config.effective_dt();

        // 加 0.5 防止浮点乘积落在整数边界下方
        let to_units = |t: f64| (ifactor * t + 0.5) as u64;

        let iiotimeprec = to_units(10f64.powi(config.iotimeprec));
        if iiotimeprec == 0 {
            return Err(TimeloopError::IoPrecisionUnderflow);
        }

        let istarttime = to_units(starttime);
        let iendtime = to_units(config.endtime);
        let isavetime = to_units(config.savetime);
        let idt = to_units(dt);
        let idtmax = to_units(config.dtmax);
        let ipostproctime = config.postproctime.map(to_units).unwrap_or(0);

        // isavetime 必须是精度单位的非零倍数，否则保存边界运算退化
        if istarttime % iiotimeprec != 0 || isavetime % iiotimeprec != 0 || isavetime == 0 {
            return Err(TimeloopError::IoTimeMisaligned);
        }

        if idt == 0 || (mode == RunMode::Post && ipostproctime == 0) {
            return Err(TimeloopError::StepUnderflow {
                precision: 1.0 / ifactor,
            });
        }

        Ok(Self {
            mode,
            rkorder,
            scheduler: SubstepScheduler::new(rkorder),
            adaptivestep: config.adaptivestep,
            outputiter: config.outputiter,
            running: true,
            time: 0.0,
            dt,
            ifactor,
            itime: 0,
            istarttime,
            iendtime,
            idt,
            idtmax,
            idtlim: idt,
            isavetime,
            ipostproctime,
            iiotimeprec,
            iotime: istarttime / iiotimeprec,
            iteration: 0,
            last_check: Instant::now(),
        })
    }

    // ========================================================
    // 级内更新
    // ========================================================

    /// 对全部预报场执行当前级的更新并推进子步
    ///
    /// 每个场：`a += cB[s]·dt·at`，随后 `at *= cA[s+1]`
    /// （级 0 的 cA 为零，相当于倾向的完全重置）。
    /// 只更新内部区域；halo 由外部边界交换负责。
    pub fn exec(&mut self, grid: &StructuredGrid, fields: &mut FieldStore) {
        let substep = self.scheduler.substep();
        let cb_dt = self.rkorder.cb()[substep] * self.dt;
        let ca_next = self.rkorder.ca()[self.scheduler.next_substep()];

        for field in fields.iter_mut() {
            let (a, at) = field.arrays_mut();
            stage_update(grid, a, at, cb_dt, ca_next);
        }

        self.scheduler.advance();
    }

    /// 当前级的有效子步长 cB[s]·dt
    #[inline]
    pub fn sub_time_step(&self) -> f64 {
        self.rkorder.cb()[self.scheduler.substep()] * self.dt
    }

    /// 是否处于子步当中
    #[inline]
    pub fn in_substep(&self) -> bool {
        self.scheduler.in_substep()
    }

    /// 当前级索引
    #[inline]
    pub fn substep(&self) -> usize {
        self.scheduler.substep()
    }

    // ========================================================
    // 规范时间推进
    // ========================================================

    /// 整步完成后推进规范时间
    ///
    /// 子步中调用为空操作。整数时间到达结束时间时清除循环标志。
    pub fn step_time(&mut self) {
        if self.in_substep() {
            return;
        }

        self.time += self.dt;
        self.itime += self.idt;
        self.iotime = self.itime / self.iiotimeprec;
        self.iteration += 1;

        if self.itime >= self.iendtime {
            self.running = false;
        }
    }

    /// 后处理模式：按 postproctime 间隔跳步
    pub fn step_post_proc_time(&mut self) {
        self.itime += self.ipostproctime;
        self.iotime = self.itime / self.iiotimeprec;

        if self.itime > self.iendtime {
            self.running = false;
        }
    }

    /// 运行是否结束
    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.running
    }

    // ========================================================
    // 步长限制
    // ========================================================

    /// 重算步长上限
    ///
    /// 上限为 dtmax、到下一保存边界的距离，以及墙钟预算临近耗尽
    /// 时到下一 IO 精度边界的距离三者的最小值。协作者的 CFL 约束
    /// 经 [`Self::impose_time_step_limit`] 另行并入。
    pub fn set_time_step_limit<C: ProcessCoordinator>(&mut self, coord: &C) {
        self.idtlim = self.idtmax;

        // 墙钟预算耗尽时把步长对齐到最近的 IO 精度边界，
        // 以便保存后整齐停机
        if coord.at_wall_clock_limit() {
            self.idtlim = self
                .idtlim
                .min(self.iiotimeprec - self.itime % self.iiotimeprec);
        }

        self.idtlim = self.idtlim.min(self.isavetime - self.itime % self.isavetime);
    }

    /// 并入外部（CFL 等）整数步长约束
    pub fn impose_time_step_limit(&mut self, idtlim: u64) {
        self.idtlim = self.idtlim.min(idtlim);
    }

    /// 并入外部浮点步长约束
    ///
    /// 与构造时一致的 +0.5 取整约定。
    pub fn impose_cfl_limit(&mut self, dt_limit: f64) {
        self.impose_time_step_limit((self.ifactor * dt_limit + 0.5) as u64);
    }

    /// 应用步长上限
    ///
    /// 自适应模式下把步长设为当前上限并重建浮点镜像；
    /// 固定步长模式只跟踪上限。子步中调用为空操作。
    pub fn set_time_step(&mut self) -> TimeloopResult<()> {
        if self.in_substep() {
            return Ok(());
        }

        if self.adaptivestep {
            if self.idt == 0 {
                return Err(TimeloopError::StepUnderflow {
                    precision: 1.0 / self.ifactor,
                });
            }
            self.idt = self.idtlim;
            self.dt = self.idt as f64 / self.ifactor;
        }

        Ok(())
    }

    // ========================================================
    // 每整步判定
    // ========================================================

    /// 是否到达诊断输出迭代
    pub fn do_check(&self) -> bool {
        self.iteration % self.outputiter as i32 == 0 && !self.in_substep()
    }

    /// 是否到达检查点保存时刻
    ///
    /// 墙钟预算耗尽时在最近的 IO 精度边界上强制保存并停机。
    pub fn do_save<C: ProcessCoordinator>(&mut self, coord: &C) -> bool {
        if self.itime % self.iiotimeprec == 0 && !self.in_substep() && coord.at_wall_clock_limit()
        {
            log::warn!("墙钟预算即将耗尽, 保存检查点后停止模拟");
            self.running = false;
            return true;
        }

        // 模拟刚启动时与子步中不保存
        self.itime % self.isavetime == 0 && self.iteration != 0 && !self.in_substep()
    }

    /// 是否可做统计
    ///
    /// 子步中与重启后的第一个迭代（itime 仍等于起始时间）不做统计。
    pub fn is_stats_step(&self) -> bool {
        !self.in_substep() && !(self.iteration > 0 && self.itime == self.istarttime)
    }

    /// 自上次调用以来的墙钟耗时 [s]
    ///
    /// 供诊断输出打印每个输出间隔的性能。
    pub fn check(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_check).as_secs_f64();
        self.last_check = now;
        elapsed
    }

    // ========================================================
    // 检查点
    // ========================================================

    /// 保存检查点
    ///
    /// 仅协调进程写文件；错误计数随后广播给所有进程，
    /// 保证失败时一致中止而非在下一个集合点死锁。
    pub fn save<C: ProcessCoordinator>(
        &self,
        coord: &C,
        directory: &Path,
        start_iotime: u64,
    ) -> TimeloopResult<()> {
        let mut nerror: u32 = 0;

        if coord.is_coordinator() {
            let record = TimeRecord {
                itime: self.itime,
                idt: self.idt,
                iteration: self.iteration,
            };
            if let Err(e) = record.save(directory, start_iotime) {
                log::error!("{e}");
                nerror += 1;
            }
        }

        coord.broadcast_u32(&mut nerror);
        if nerror > 0 {
            return Err(TimeloopError::CheckpointSaveFailed);
        }
        Ok(())
    }

    /// 加载检查点
    ///
    /// 协调进程读取记录后将三个字段广播给所有进程，
    /// 浮点镜像由整数值除以缩放因子重建。
    pub fn load<C: ProcessCoordinator>(
        &mut self,
        coord: &C,
        directory: &Path,
        start_iotime: u64,
    ) -> TimeloopResult<()> {
        let mut nerror: u32 = 0;

        if coord.is_coordinator() {
            match TimeRecord::load(directory, start_iotime) {
                Ok(record) => {
                    self.itime = record.itime;
                    self.idt = record.idt;
                    self.iteration = record.iteration;
                }
                Err(e) => {
                    log::error!("{e}");
                    nerror += 1;
                }
            }
        }

        coord.broadcast_u32(&mut nerror);
        if nerror > 0 {
            return Err(TimeloopError::CheckpointLoadFailed);
        }

        coord.broadcast_u64(&mut self.itime);
        coord.broadcast_u64(&mut self.idt);
        coord.broadcast_i32(&mut self.iteration);

        self.time = self.itime as f64 / self.ifactor;
        self.dt = self.idt as f64 / self.ifactor;
        self.iotime = self.itime / self.iiotimeprec;

        Ok(())
    }

    // ========================================================
    // 时间插值辅助
    // ========================================================

    /// 在严格递增的参考时刻序列中定位当前时间
    ///
    /// 首个参考时刻之前钳制到第一项（权重 0,1），末个参考时刻
    /// 之后钳制到最后一项（权重 1,0），否则给出括号对与线性权重。
    pub fn interpolation_factors(&self, timevec: &[f64]) -> InterpolationFactors {
        let mut index1 = 0usize;
        for &t in timevec {
            if self.time < t {
                break;
            }
            index1 += 1;
        }

        if index1 == 0 {
            InterpolationFactors {
                index0: 0,
                index1: 0,
                fac0: 0.0,
                fac1: 1.0,
            }
        } else if index1 == timevec.len() {
            let index0 = index1 - 1;
            InterpolationFactors {
                index0,
                index1: index0,
                fac0: 1.0,
                fac1: 0.0,
            }
        } else {
            let index0 = index1 - 1;
            let span = timevec[index1] - timevec[index0];
            InterpolationFactors {
                index0,
                index1,
                fac0: (timevec[index1] - self.time) / span,
                fac1: (self.time - timevec[index0]) / span,
            }
        }
    }

    // ========================================================
    // 访问器
    // ========================================================

    /// 当前模拟时间 [s]
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 当前步长 [s]
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// 当前整数时间
    #[inline]
    pub fn itime(&self) -> u64 {
        self.itime
    }

    /// 当前整数步长
    #[inline]
    pub fn idt(&self) -> u64 {
        self.idt
    }

    /// 当前步长上限（整数单位）
    #[inline]
    pub fn idtlim(&self) -> u64 {
        self.idtlim
    }

    /// 输出时间计数（整数时间除以 IO 精度单位）
    #[inline]
    pub fn iotime(&self) -> u64 {
        self.iotime
    }

    /// 迭代计数
    #[inline]
    pub fn iteration(&self) -> i32 {
        self.iteration
    }

    /// RK 阶数
    #[inline]
    pub fn rkorder(&self) -> RkOrder {
        self.rkorder
    }

    /// 运行模式
    #[inline]
    pub fn mode(&self) -> RunMode {
        self.mode
    }
}

/// 单场单级更新内核
///
/// 两趟内部区域循环：先累加级内份额，再按下一级系数缩放倾向。
fn stage_update(grid: &StructuredGrid, a: &mut [f64], at: &mut [f64], cb_dt: f64, ca_next: f64) {
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            let base = j * grid.icells + k * grid.ijcells;
            for i in grid.istart..grid.iend {
                let ijk = base + i;
                a[ijk] += cb_dt * at[ijk];
            }
        }
    }

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            let base = j * grid.icells + k * grid.ijcells;
            for i in grid.istart..grid.iend {
                let ijk = base + i;
                at[ijk] *= ca_next;
            }
        }
    }
}

// ============================================================
// 测试
// ============================================================
