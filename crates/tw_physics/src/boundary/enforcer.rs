// crates/tw_physics/src/boundary/enforcer.rs

//! 边界强制器
//!
//! 目录的逐步应用阶段：用模板重构值覆写每个幽灵单元的场值
//! （或倾向，取决于调用点）。
//!
//! 重构利用预计算的伪逆权重矩阵：右端项由边界点上的边界条件值
//! 与模板流体点的当前场值组成，解得一次多项式系数后在幽灵单元
//! 自身位置求值。结果在 (xb, yb, zb) 处满足边界条件，并通过
//! 流体侧模板光滑插值。
//!
//! 副作用：仅就地改写幽灵单元索引处的数组元素，其余索引不变。
//! 必须在每次倾向计算之后、该子步的时间积分更新之前，对每个
//! 场类别调用。

use tw_runtime::StructuredGrid;

use super::catalog::{evaluate_basis, GhostCellCatalog};
use super::BoundaryError;

// ============================================================
// 边界条件
// ============================================================

/// 幽灵单元处强制的边界条件类型
///
/// 三种类型都归结为在最近边界点上强制一个值：
/// 速度分量为零（无穿透/无滑移），标量为给定的 Dirichlet 值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// 无穿透：法向速度分量在边界上为零
    NoPenetration,
    /// 无滑移：切向速度分量在边界上为零
    NoSlip,
    /// Dirichlet：边界点上的给定值
    Dirichlet(f64),
}

impl BoundaryCondition {
    /// 边界点上强制的值
    #[inline]
    pub fn boundary_value(&self) -> f64 {
        match self {
            Self::NoPenetration | Self::NoSlip => 0.0,
            Self::Dirichlet(value) => *value,
        }
    }
}

// ============================================================
// 边界强制器
// ============================================================

/// 边界强制器
///
/// 无状态组件；所有几何信息来自目录，场数据来自调用方。
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryEnforcer;

impl BoundaryEnforcer {
    /// 创建强制器
    pub fn new() -> Self {
        Self
    }

    /// 对单个场数组应用目录
    ///
    /// # 参数
    /// - `catalog`: 该场类别的幽灵单元目录
    /// - `grid`: 结构化网格（提供展平索引）
    /// - `data`: 场值或倾向数组（就地改写幽灵索引）
    /// - `bc`: 边界条件
    pub fn apply(
        &self,
        catalog: &GhostCellCatalog,
        grid: &StructuredGrid,
        data: &mut [f64],
        bc: BoundaryCondition,
    ) -> Result<(), BoundaryError> {
        if data.len() != catalog.expected_len() {
            return Err(BoundaryError::SizeMismatch {
                expected: catalog.expected_len(),
                actual: data.len(),
            });
        }

        let bc_value = bc.boundary_value();
        let mut rhs: Vec<f64> = Vec::new();

        for cell in catalog.cells() {
            rhs.clear();
            rhs.push(bc_value);
            for nb in &cell.neighbours {
                rhs.push(data[grid.index(nb.i, nb.j, nb.k)]);
            }

            let coeffs = cell.weights.coefficients(&rhs);
            data[grid.index(cell.i, cell.j, cell.k)] = evaluate_basis(&coeffs, cell.ghost_offset);
        }

        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::catalog::CellClass;
    use crate::boundary::geometry::BoundaryShape;
    use crate::boundary::catalog::classify_points;
    use tw_runtime::StaggerLocation;

    fn setup() -> (StructuredGrid, GhostCellCatalog) {
        let grid = StructuredGrid::equidistant(8, 8, 8, 8.0, 8.0, 8.0, 1).unwrap();
        let shape = BoundaryShape::None { z_offset: 2.2 };
        let catalog =
            GhostCellCatalog::build(&grid, &shape, StaggerLocation::Center, 8).unwrap();
        (grid, catalog)
    }

    #[test]
    fn test_boundary_condition_values() {
        assert!((BoundaryCondition::NoPenetration.boundary_value() - 0.0).abs() < 1e-15);
        assert!((BoundaryCondition::NoSlip.boundary_value() - 0.0).abs() < 1e-15);
        assert!((BoundaryCondition::Dirichlet(3.5).boundary_value() - 3.5).abs() < 1e-15);
    }

    #[test]
    fn test_reconstruction_exactness_linear_field() {
        let (grid, catalog) = setup();
        assert!(!catalog.is_empty());

        // 只随 z 变化的线性场：所有边界点 (z=2.2) 上取同一值
        let p = |z: f64| 2.0 + 0.5 * z;
        let bc = BoundaryCondition::Dirichlet(p(2.2));

        let mut data = vec![0.0; grid.ncells()];
        for k in 0..grid.kcells {
            for j in 0..grid.jcells {
                for i in 0..grid.icells {
                    data[grid.index(i, j, k)] = p(grid.z[k]);
                }
            }
        }

        let enforcer = BoundaryEnforcer::new();
        enforcer.apply(&catalog, &grid, &mut data, bc).unwrap();

        // 基内多项式在幽灵单元位置被精确复现
        for cell in catalog.cells() {
            let value = data[grid.index(cell.i, cell.j, cell.k)];
            assert!(
                (value - p(grid.z[cell.k])).abs() < 1e-9,
                "ghost ({},{},{}) value {} expected {}",
                cell.i,
                cell.j,
                cell.k,
                value,
                p(grid.z[cell.k])
            );
        }
    }

    #[test]
    fn test_only_ghost_indices_mutated() {
        let (grid, catalog) = setup();
        let class = classify_points(
            &grid,
            &BoundaryShape::None { z_offset: 2.2 },
            StaggerLocation::Center,
        );

        // 可辨识的初始模式
        let mut data: Vec<f64> = (0..grid.ncells()).map(|n| n as f64 * 0.01).collect();
        let before = data.clone();

        let enforcer = BoundaryEnforcer::new();
        enforcer
            .apply(&catalog, &grid, &mut data, BoundaryCondition::NoSlip)
            .unwrap();

        for (ijk, (&now, &was)) in data.iter().zip(&before).enumerate() {
            if class[ijk] == CellClass::Ghost {
                continue;
            }
            assert!((now - was).abs() < 1e-15, "index {ijk} mutated unexpectedly");
        }
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let (grid, catalog) = setup();
        let mut wrong = vec![0.0; grid.ncells() - 1];
        let enforcer = BoundaryEnforcer::new();
        assert!(matches!(
            enforcer.apply(&catalog, &grid, &mut wrong, BoundaryCondition::NoSlip),
            Err(BoundaryError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_dirichlet_drives_ghosts_toward_zero() {
        let (grid, catalog) = setup();

        // 常数场 + 零边界值：重构值必须低于流体值（被边界拉低）
        let mut data = vec![1.0; grid.ncells()];
        let enforcer = BoundaryEnforcer::new();
        enforcer
            .apply(&catalog, &grid, &mut data, BoundaryCondition::Dirichlet(0.0))
            .unwrap();

        for cell in catalog.cells() {
            let value = data[grid.index(cell.i, cell.j, cell.k)];
            assert!(value < 1.0 + 1e-12);
        }
    }
}
