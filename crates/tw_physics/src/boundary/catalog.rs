// crates/tw_physics/src/boundary/catalog.rs

//! 幽灵单元目录
//!
//! 本模块实现浸没边界的一次性几何分类与模板预计算：
//! - CellClass: 网格点分类（固体/流体/幽灵）
//! - Neighbour: 模板中的流体点引用
//! - WeightMatrix: 最小二乘重构的伪逆权重矩阵（扁平缓冲）
//! - GhostCell: 单个幽灵单元的完整记录
//! - GhostCellCatalog: 按场类别（u/v/w/标量）构建的幽灵单元集合
//!
//! # 构建流程
//!
//! 1. 按交错位置对每个网格点分类：垂直坐标低于边界高程为固体，
//!    流体点若有直接相邻（六连通）固体点则为幽灵单元；
//! 2. 对每个幽灵单元做最近边界点搜索（黄金分割极小化，固定容差
//!    与迭代上限，保证重启逐位可复现）；
//! 3. 选取离幽灵单元最近的 n 个非幽灵流体点构成模板，并以
//!    (距离, k, j, i) 排序消除并列歧义；
//! 4. 以边界点为原点构建设计矩阵 [1, dx, dy, dz]，求伪逆
//!    B = (AᵀA)⁻¹Aᵀ 并按扁平布局存储。
//!
//! 几何退化（模板不足、法方程奇异）在构建期即报致命错误，
//! 不做降阶回退。目录构建后不可变；几何在整个运行期间静态。

use glam::DVec3;
use nalgebra::DMatrix;
use rayon::prelude::*;

use tw_runtime::{StaggerLocation, StructuredGrid};

use super::geometry::{BoundaryShape, Dimensionality};
use super::BoundaryError;

// ============================================================
// 搜索常数
// ============================================================

/// 黄金分割比 (sqrt(5)-1)/2
const INVPHI: f64 = 0.618_033_988_749_894_9;

/// 黄金分割迭代上限
const SEARCH_MAX_ITER: usize = 128;

/// 收敛容差相对搜索区间宽度的比例
const SEARCH_TOL_FACTOR: f64 = 1.0e-11;

/// 二维形状的坐标轮换扫描次数
const SEARCH_SWEEPS: usize = 2;

// ============================================================
// 网格点分类
// ============================================================

/// 网格点分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CellClass {
    /// 固体：位于边界高程之下
    Solid = 0,
    /// 流体
    Fluid = 1,
    /// 幽灵单元：流体侧但直接相邻固体
    Ghost = 2,
}

/// 对给定交错位置的全部网格点（含 halo）分类
///
/// 幽灵标记只在内部区域进行；halo 点保持固体/流体二分。
pub(crate) fn classify_points(
    grid: &StructuredGrid,
    shape: &BoundaryShape,
    location: StaggerLocation,
) -> Vec<CellClass> {
    let (xs, ys, zs) = grid.stagger_coords(location);
    let icells = grid.icells;
    let ijcells = grid.ijcells;

    // 固体掩码：逐点求值边界高程，可并行
    let mut class: Vec<CellClass> = (0..grid.ncells())
        .into_par_iter()
        .map(|ijk| {
            let k = ijk / ijcells;
            let rem = ijk % ijcells;
            let j = rem / icells;
            let i = rem % icells;
            if zs[k] < shape.elevation(xs[i], ys[j]) {
                CellClass::Solid
            } else {
                CellClass::Fluid
            }
        })
        .collect();

    // 幽灵标记：流体点且六连通邻居中存在固体
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = grid.index(i, j, k);
                if class[ijk] != CellClass::Fluid {
                    continue;
                }
                let solid_neighbour = class[grid.index(i - 1, j, k)] == CellClass::Solid
                    || class[grid.index(i + 1, j, k)] == CellClass::Solid
                    || class[grid.index(i, j - 1, k)] == CellClass::Solid
                    || class[grid.index(i, j + 1, k)] == CellClass::Solid
                    || class[grid.index(i, j, k - 1)] == CellClass::Solid
                    || class[grid.index(i, j, k + 1)] == CellClass::Solid;
                if solid_neighbour {
                    class[ijk] = CellClass::Ghost;
                }
            }
        }
    }

    class
}

// ============================================================
// 最近边界点搜索
// ============================================================

/// 一维黄金分割极小化
///
/// 固定的区间收缩序列与迭代上限保证结果对相同输入逐位一致。
fn golden_section_min(f: impl Fn(f64) -> f64, mut a: f64, mut b: f64) -> f64 {
    let tol = SEARCH_TOL_FACTOR * (b - a).abs();
    let mut c = b - INVPHI * (b - a);
    let mut d = a + INVPHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..SEARCH_MAX_ITER {
        if (b - a).abs() <= tol {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INVPHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INVPHI * (b - a);
            fd = f(d);
        }
    }

    0.5 * (a + b)
}

/// 点到矩形边界的投影（足印侧壁用）
fn project_to_rect_edge(px: f64, py: f64, x0: f64, y0: f64, hx: f64, hy: f64) -> (f64, f64) {
    let cx = px.clamp(x0 - hx, x0 + hx);
    let cy = py.clamp(y0 - hy, y0 + hy);
    if cx != px || cy != py {
        // 足印外：直接钳制到最近边
        return (cx, cy);
    }
    // 足印内：移动到最近的一条边
    let d_left = px - (x0 - hx);
    let d_right = (x0 + hx) - px;
    let d_low = py - (y0 - hy);
    let d_high = (y0 + hy) - py;
    let min_d = d_left.min(d_right).min(d_low).min(d_high);
    if min_d == d_left {
        (x0 - hx, py)
    } else if min_d == d_right {
        (x0 + hx, py)
    } else if min_d == d_low {
        (px, y0 - hy)
    } else {
        (px, y0 + hy)
    }
}

/// 搜索幽灵单元到边界表面的最近点
///
/// 平坦与台块形状使用封闭形式；光滑形状沿水平方向做黄金分割
/// 极小化（二维时做固定次数的坐标轮换扫描）。
pub(crate) fn nearest_boundary_point(
    shape: &BoundaryShape,
    ghost: DVec3,
    fallback_halfwidth: f64,
) -> DVec3 {
    match shape {
        BoundaryShape::None { z_offset } => DVec3::new(ghost.x, ghost.y, *z_offset),

        BoundaryShape::Block {
            amplitude,
            z_offset,
            x0,
            y0,
            half_x,
            half_y,
            dims,
        } => {
            // 候选一：垂直投影到局部高程
            let top = DVec3::new(ghost.x, ghost.y, shape.elevation(ghost.x, ghost.y));

            // 候选二：投影到台块侧壁
            let (ex, ey) = match dims {
                Dimensionality::One => {
                    let (ex, _) = project_to_rect_edge(ghost.x, 0.0, *x0, 0.0, *half_x, f64::MAX);
                    (ex, ghost.y)
                }
                Dimensionality::Two => {
                    project_to_rect_edge(ghost.x, ghost.y, *x0, *y0, *half_x, *half_y)
                }
            };
            let side = DVec3::new(ex, ey, ghost.z.clamp(*z_offset, z_offset + amplitude));

            if ghost.distance_squared(top) <= ghost.distance_squared(side) {
                top
            } else {
                side
            }
        }

        _ => {
            let w = shape.search_halfwidth(fallback_halfwidth);
            let dist2 = |x: f64, y: f64| {
                let zb = shape.elevation(x, y);
                (x - ghost.x).powi(2) + (y - ghost.y).powi(2) + (zb - ghost.z).powi(2)
            };

            let mut xb = ghost.x;
            let mut yb = ghost.y;
            match shape.dims() {
                Dimensionality::One => {
                    xb = golden_section_min(|x| dist2(x, yb), ghost.x - w, ghost.x + w);
                }
                Dimensionality::Two => {
                    for _ in 0..SEARCH_SWEEPS {
                        xb = golden_section_min(|x| dist2(x, yb), ghost.x - w, ghost.x + w);
                        yb = golden_section_min(|y| dist2(xb, y), ghost.y - w, ghost.y + w);
                    }
                }
            }

            DVec3::new(xb, yb, shape.elevation(xb, yb))
        }
    }
}

// ============================================================
// 模板与权重矩阵
// ============================================================

/// 模板中的流体点引用
///
/// `distance` 为该点到幽灵单元边界投影点的欧氏距离。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// 网格索引 (x)
    pub i: usize,
    /// 网格索引 (y)
    pub j: usize,
    /// 网格索引 (z)
    pub k: usize,
    /// 到边界投影点的距离 [m]
    pub distance: f64,
}

/// 最小二乘重构的权重矩阵
///
/// 扁平化存储的伪逆 B = (AᵀA)⁻¹Aᵀ，尺寸为 基函数数 × (1 + 模板点数)。
/// 第 0 列对应边界点约束，其余列对应模板流体点。
/// 模板大小确定后尺寸固定，因此采用连续缓冲而非嵌套结构。
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// 一次多项式基的项数: [1, dx, dy, dz]
pub const BASIS_SIZE: usize = 4;

impl WeightMatrix {
    /// 从相对边界点的偏移构建伪逆
    ///
    /// `offsets[0]` 必须是边界点自身（零偏移）。法方程矩阵奇异
    /// （模板共线/共面）时返回 None，由调用方升级为致命错误。
    pub(crate) fn build(offsets: &[DVec3]) -> Option<Self> {
        let m = offsets.len();
        if m < BASIS_SIZE {
            return None;
        }

        let a = DMatrix::<f64>::from_fn(m, BASIS_SIZE, |r, c| match c {
            0 => 1.0,
            1 => offsets[r].x,
            2 => offsets[r].y,
            _ => offsets[r].z,
        });

        let normal = a.transpose() * &a;
        let inverse = normal.try_inverse()?;
        if inverse.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let b = inverse * a.transpose();
        let mut data = Vec::with_capacity(BASIS_SIZE * m);
        for r in 0..BASIS_SIZE {
            for c in 0..m {
                data.push(b[(r, c)]);
            }
        }

        Some(Self {
            rows: BASIS_SIZE,
            cols: m,
            data,
        })
    }

    /// 基函数数（行数）
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 右端项长度（列数 = 1 + 模板点数）
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 求重构多项式系数 c = B · rhs
    ///
    /// `rhs[0]` 为边界点上的边界条件值，其余为模板点场值。
    #[inline]
    pub fn coefficients(&self, rhs: &[f64]) -> [f64; BASIS_SIZE] {
        debug_assert_eq!(rhs.len(), self.cols);
        let mut c = [0.0; BASIS_SIZE];
        for (r, coeff) in c.iter_mut().enumerate() {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            let mut acc = 0.0;
            for (w, v) in row.iter().zip(rhs) {
                acc += w * v;
            }
            *coeff = acc;
        }
        c
    }
}

/// 在给定偏移处求值重构多项式
#[inline]
pub fn evaluate_basis(c: &[f64; BASIS_SIZE], offset: DVec3) -> f64 {
    c[0] + c[1] * offset.x + c[2] * offset.y + c[3] * offset.z
}

// ============================================================
// 幽灵单元
// ============================================================

/// 单个幽灵单元记录
///
/// 构建后不可变；几何变化需要整体重建目录（基础设计不支持）。
#[derive(Debug, Clone)]
pub struct GhostCell {
    /// 网格索引 (x)
    pub i: usize,
    /// 网格索引 (y)
    pub j: usize,
    /// 网格索引 (z)
    pub k: usize,
    /// 边界表面上的最近点
    pub boundary_point: DVec3,
    /// 幽灵单元位置相对边界点的偏移
    pub ghost_offset: DVec3,
    /// 插值模板（按到幽灵单元的距离排序）
    pub neighbours: Vec<Neighbour>,
    /// 预计算的伪逆权重矩阵
    pub weights: WeightMatrix,
}

// ============================================================
// 幽灵单元目录
// ============================================================

/// 幽灵单元目录
///
/// 每个场类别（u/v/w/标量）各自独立构建一份；
/// 构建一次后每步复用。
#[derive(Debug, Clone)]
pub struct GhostCellCatalog {
    location: StaggerLocation,
    ncells: usize,
    cells: Vec<GhostCell>,
}

impl GhostCellCatalog {
    /// 构建目录
    ///
    /// # 参数
    /// - `grid`: 结构化网格（halo 宽度至少为 1）
    /// - `shape`: 边界形状
    /// - `location`: 场的交错位置
    /// - `n_neighbours`: 模板流体点数
    pub fn build(
        grid: &StructuredGrid,
        shape: &BoundaryShape,
        location: StaggerLocation,
        n_neighbours: usize,
    ) -> Result<Self, BoundaryError> {
        if grid.igc < 1 || grid.jgc < 1 || grid.kgc < 1 {
            return Err(BoundaryError::InsufficientHalo);
        }

        let class = classify_points(grid, shape, location);

        // 幽灵单元列表：按 (k, j, i) 顺序收集，保证确定性
        let mut ghost_indices = Vec::new();
        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    if class[grid.index(i, j, k)] == CellClass::Ghost {
                        ghost_indices.push((i, j, k));
                    }
                }
            }
        }

        let fallback_halfwidth = 4.0 * grid.dx.max(grid.dy);

        let cells: Vec<GhostCell> = ghost_indices
            .par_iter()
            .map(|&(i, j, k)| {
                build_ghost_cell(grid, shape, location, &class, i, j, k, n_neighbours, fallback_halfwidth)
            })
            .collect::<Result<_, _>>()?;

        log::debug!(
            "浸没边界目录 ({}) 构建完成: {} 个幽灵单元",
            location.name(),
            cells.len()
        );

        Ok(Self {
            location,
            ncells: grid.ncells(),
            cells,
        })
    }

    /// 场的交错位置
    #[inline]
    pub fn location(&self) -> StaggerLocation {
        self.location
    }

    /// 目录所属网格的总单元数（用于应用期的大小校验）
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.ncells
    }

    /// 幽灵单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// 是否为空（边界不与本子域相交时为真）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 幽灵单元记录
    #[inline]
    pub fn cells(&self) -> &[GhostCell] {
        &self.cells
    }
}

/// 构建单个幽灵单元记录
#[allow(clippy::too_many_arguments)]
fn build_ghost_cell(
    grid: &StructuredGrid,
    shape: &BoundaryShape,
    location: StaggerLocation,
    class: &[CellClass],
    i: usize,
    j: usize,
    k: usize,
    n_neighbours: usize,
    fallback_halfwidth: f64,
) -> Result<GhostCell, BoundaryError> {
    let (xs, ys, zs) = grid.stagger_coords(location);
    let ghost = DVec3::new(xs[i], ys[j], zs[k]);

    let boundary_point = nearest_boundary_point(shape, ghost, fallback_halfwidth);
    let neighbours = select_stencil(grid, class, location, ghost, boundary_point, i, j, k, n_neighbours)?;

    // 设计矩阵偏移：边界点约束在前，模板点随后
    let mut offsets = Vec::with_capacity(1 + neighbours.len());
    offsets.push(DVec3::ZERO);
    for nb in &neighbours {
        let p = DVec3::new(xs[nb.i], ys[nb.j], zs[nb.k]);
        offsets.push(p - boundary_point);
    }

    let weights =
        WeightMatrix::build(&offsets).ok_or(BoundaryError::DegenerateStencil { i, j, k })?;

    Ok(GhostCell {
        i,
        j,
        k,
        boundary_point,
        ghost_offset: ghost - boundary_point,
        neighbours,
        weights,
    })
}

/// 选取离幽灵单元最近的 n 个非幽灵流体点
///
/// 以立方索引窗逐圈扩展直到候选足够，再多扩一圈以缓解各向异性
/// 网格下的窗口截断，最后按 (到幽灵单元距离, k, j, i) 排序取前 n。
#[allow(clippy::too_many_arguments)]
fn select_stencil(
    grid: &StructuredGrid,
    class: &[CellClass],
    location: StaggerLocation,
    ghost: DVec3,
    boundary_point: DVec3,
    gi: usize,
    gj: usize,
    gk: usize,
    n_neighbours: usize,
) -> Result<Vec<Neighbour>, BoundaryError> {
    let (xs, ys, zs) = grid.stagger_coords(location);

    let max_radius = (grid.iend - grid.istart)
        .max(grid.jend - grid.jstart)
        .max(grid.kend - grid.kstart);

    let gather = |radius: usize| -> Vec<(f64, usize, usize, usize)> {
        let i_lo = grid.istart.max(gi.saturating_sub(radius));
        let i_hi = grid.iend.min(gi + radius + 1);
        let j_lo = grid.jstart.max(gj.saturating_sub(radius));
        let j_hi = grid.jend.min(gj + radius + 1);
        let k_lo = grid.kstart.max(gk.saturating_sub(radius));
        let k_hi = grid.kend.min(gk + radius + 1);

        let mut found = Vec::new();
        for k in k_lo..k_hi {
            for j in j_lo..j_hi {
                for i in i_lo..i_hi {
                    if class[grid.index(i, j, k)] != CellClass::Fluid {
                        continue;
                    }
                    let p = DVec3::new(xs[i], ys[j], zs[k]);
                    found.push((ghost.distance_squared(p), k, j, i));
                }
            }
        }
        found
    };

    let mut radius = 2usize;
    let mut candidates = gather(radius);
    while candidates.len() < n_neighbours && radius < max_radius {
        radius += 1;
        candidates = gather(radius);
    }

    if candidates.len() < n_neighbours {
        return Err(BoundaryError::ShortStencil {
            i: gi,
            j: gj,
            k: gk,
            needed: n_neighbours,
            found: candidates.len(),
        });
    }

    if radius < max_radius {
        candidates = gather(radius + 1);
    }

    candidates.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
            .then(a.3.cmp(&b.3))
    });

    Ok(candidates
        .into_iter()
        .take(n_neighbours)
        .map(|(_, k, j, i)| {
            let p = DVec3::new(xs[i], ys[j], zs[k]);
            Neighbour {
                i,
                j,
                k,
                distance: boundary_point.distance(p),
            }
        })
        .collect())
}

// ============================================================
// 测试
// ============================================================
