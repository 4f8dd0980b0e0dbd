// crates/tw_physics/src/boundary/mod.rs

//! 浸没边界层
//!
//! 幽灵单元法让任意固体几何切过规则结构化网格：
//!
//! - [`geometry`]: 边界表面的参数化描述（纯函数）
//! - [`catalog`]: 一次性几何分类与模板/权重预计算
//! - [`enforcer`]: 逐步应用：重构幽灵单元的值/倾向
//!
//! [`ImmersedBoundary`] 把四份目录（u、v、w、标量各自的交错位置）
//! 与每类的边界条件绑定为一个整体，供时间积分循环在每个子步
//! 调用。

pub mod catalog;
pub mod enforcer;
pub mod geometry;

use std::sync::Arc;

use thiserror::Error;

use tw_config::{BoundaryType, ConfigError, ImmersedBoundaryConfig};
use tw_runtime::{FieldStore, StaggerLocation, StructuredGrid};

pub use catalog::{CellClass, GhostCell, GhostCellCatalog, Neighbour, WeightMatrix, BASIS_SIZE};
pub use enforcer::{BoundaryCondition, BoundaryEnforcer};
pub use geometry::{BoundaryShape, Dimensionality, ElevationProvider, TabulatedElevation};

// ============================================================
// 错误类型
// ============================================================

/// 浸没边界错误
///
/// 几何/数值错误（模板不足、法方程奇异）在构建期即为致命错误：
/// 没有可用的边界表示时，运行不能继续。
#[derive(Error, Debug)]
pub enum BoundaryError {
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 形状参数非法
    #[error("边界形状非法: {0}")]
    InvalidShape(String),

    /// 高程表无效
    #[error("高程表无效: {0}")]
    InvalidElevationTable(String),

    /// 网格 halo 不足
    #[error("网格 halo 宽度不足: 浸没边界分类要求各方向至少 1")]
    InsufficientHalo,

    /// 模板流体点不足
    #[error("幽灵单元 ({i},{j},{k}) 的重构模板不足: 需要 {needed} 个流体点, 仅找到 {found} 个")]
    ShortStencil {
        /// 网格索引 (x)
        i: usize,
        /// 网格索引 (y)
        j: usize,
        /// 网格索引 (z)
        k: usize,
        /// 需要的模板点数
        needed: usize,
        /// 实际找到的模板点数
        found: usize,
    },

    /// 模板几何退化
    #[error("幽灵单元 ({i},{j},{k}) 的模板几何退化, 法方程矩阵奇异")]
    DegenerateStencil {
        /// 网格索引 (x)
        i: usize,
        /// 网格索引 (y)
        j: usize,
        /// 网格索引 (z)
        k: usize,
    },

    /// 场数组大小与目录不符
    #[error("场数组大小不匹配: 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },
}

/// 浸没边界结果类型
pub type BoundaryResult<T> = Result<T, BoundaryError>;

// ============================================================
// 浸没边界整体
// ============================================================

/// 浸没边界
///
/// 持有边界形状与四份独立目录（速度三分量与标量的交错位置不同，
/// 必须各自分类）。目录在构造时一次性建立，之后不可变。
#[derive(Debug)]
pub struct ImmersedBoundary {
    shape: BoundaryShape,
    scalar_bc: f64,
    enforcer: BoundaryEnforcer,
    catalog_u: GhostCellCatalog,
    catalog_v: GhostCellCatalog,
    catalog_w: GhostCellCatalog,
    catalog_s: GhostCellCatalog,
}

impl ImmersedBoundary {
    /// 从配置构建
    ///
    /// 配置校验、形状构造与四份目录的几何预计算都在此完成；
    /// 任何失败都是致命的配置/几何错误。
    pub fn from_config(
        config: &ImmersedBoundaryConfig,
        grid: &StructuredGrid,
    ) -> BoundaryResult<Self> {
        config.validate()?;
        let shape = shape_from_config(config)?;
        Self::new(shape, config.n_neighbours, config.sbot, grid)
    }

    /// 从既有形状构建
    pub fn new(
        shape: BoundaryShape,
        n_neighbours: usize,
        scalar_bc: f64,
        grid: &StructuredGrid,
    ) -> BoundaryResult<Self> {
        let catalog_u = GhostCellCatalog::build(grid, &shape, StaggerLocation::U, n_neighbours)?;
        let catalog_v = GhostCellCatalog::build(grid, &shape, StaggerLocation::V, n_neighbours)?;
        let catalog_w = GhostCellCatalog::build(grid, &shape, StaggerLocation::W, n_neighbours)?;
        let catalog_s =
            GhostCellCatalog::build(grid, &shape, StaggerLocation::Center, n_neighbours)?;

        log::info!(
            "浸没边界 ({}) 就绪: 幽灵单元 u={} v={} w={} s={}",
            shape.name(),
            catalog_u.len(),
            catalog_v.len(),
            catalog_w.len(),
            catalog_s.len()
        );

        Ok(Self {
            shape,
            scalar_bc,
            enforcer: BoundaryEnforcer::new(),
            catalog_u,
            catalog_v,
            catalog_w,
            catalog_s,
        })
    }

    /// 边界形状
    pub fn shape(&self) -> &BoundaryShape {
        &self.shape
    }

    /// 给定交错位置的目录
    pub fn catalog(&self, location: StaggerLocation) -> &GhostCellCatalog {
        match location {
            StaggerLocation::U => &self.catalog_u,
            StaggerLocation::V => &self.catalog_v,
            StaggerLocation::W => &self.catalog_w,
            StaggerLocation::Center => &self.catalog_s,
        }
    }

    /// 场类别对应的边界条件
    ///
    /// 速度分量在边界上为零（法向无穿透、切向无滑移），
    /// 标量取配置的 Dirichlet 值。
    fn field_condition(&self, location: StaggerLocation) -> BoundaryCondition {
        match location {
            StaggerLocation::W => BoundaryCondition::NoPenetration,
            StaggerLocation::U | StaggerLocation::V => BoundaryCondition::NoSlip,
            StaggerLocation::Center => BoundaryCondition::Dirichlet(self.scalar_bc),
        }
    }

    /// 对全部预报场的场值应用边界重构
    pub fn apply_fields(
        &self,
        grid: &StructuredGrid,
        fields: &mut FieldStore,
    ) -> BoundaryResult<()> {
        for field in fields.iter_mut() {
            let bc = self.field_condition(field.location);
            self.enforcer
                .apply(self.catalog(field.location), grid, &mut field.data, bc)?;
        }
        Ok(())
    }

    /// 对全部预报场的倾向应用边界重构
    ///
    /// 边界值在子步内保持不变，因此倾向在边界点上为零。
    /// 必须在每次倾向计算之后、积分器更新之前调用。
    pub fn apply_tendencies(
        &self,
        grid: &StructuredGrid,
        fields: &mut FieldStore,
    ) -> BoundaryResult<()> {
        for field in fields.iter_mut() {
            self.enforcer.apply(
                self.catalog(field.location),
                grid,
                &mut field.tend,
                BoundaryCondition::Dirichlet(0.0),
            )?;
        }
        Ok(())
    }

    /// 整步完成后输出一次诊断摘要
    ///
    /// 子步中禁止运行（由积分器的子步状态门控）。
    pub fn log_summary(&self, in_substep: bool) {
        if in_substep {
            return;
        }
        log::debug!(
            "浸没边界幽灵单元: u={} v={} w={} s={}",
            self.catalog_u.len(),
            self.catalog_v.len(),
            self.catalog_w.len(),
            self.catalog_s.len()
        );
    }
}

/// 从配置构造边界形状
fn shape_from_config(config: &ImmersedBoundaryConfig) -> BoundaryResult<BoundaryShape> {
    let dims = Dimensionality::from_config(config.xy_dims)?;

    let shape = match config.boundary_type {
        BoundaryType::None => BoundaryShape::None {
            z_offset: config.z_offset,
        },

        BoundaryType::Sine => BoundaryShape::Sine {
            amplitude: config.amplitude,
            z_offset: config.z_offset,
            wavelength_x: config.wavelength_x,
            wavelength_y: config.wavelength_y,
            dims,
        },

        BoundaryType::Gaussian => BoundaryShape::Gaussian {
            amplitude: config.amplitude,
            z_offset: config.z_offset,
            x0: config.x0_hill,
            y0: config.y0_hill,
            sigma_x: config.sigma_x_hill,
            sigma_y: config.sigma_y_hill,
            dims,
        },

        BoundaryType::Block => BoundaryShape::Block {
            amplitude: config.amplitude,
            z_offset: config.z_offset,
            x0: config.x0_block,
            y0: config.y0_block,
            half_x: 0.5 * config.xwidth_block,
            half_y: 0.5 * config.ywidth_block,
            dims,
        },

        BoundaryType::User => {
            let path = config
                .elevation_file
                .as_ref()
                .ok_or(ConfigError::MissingKey {
                    key: "elevation_file",
                })?;
            let table = TabulatedElevation::from_profile_csv(path)?;
            BoundaryShape::User {
                provider: Arc::new(table),
            }
        }
    };

    Ok(shape)
}

// ============================================================
// 测试
// ============================================================
