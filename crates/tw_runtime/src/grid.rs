// crates/tw_runtime/src/grid.rs

//! 结构化交错网格
//!
//! 本模块提供求解器核心消费的网格元数据：
//! - StructuredGrid: 各方向起止索引、步长与坐标数组
//! - StaggerLocation: 交错位置枚举（u/v/w 分量与标量中心）
//!
//! # 交错布局
//!
//! 采用 Arakawa-C 交错：标量位于单元中心 (x, y, z)，
//! u 位于 x 方向面心 (xh, y, z)，v 位于 (x, yh, z)，w 位于 (x, y, zh)。
//! 数组按 `ijk = i + j*icells + k*ijcells` 展平，halo 单元包含在内。
//!
//! # 职责边界
//!
//! 网格生成属于外部协作者；`equidistant` 构造器仅作为接口夹具存在，
//! 供测试与演示驱动使用。

use tw_foundation::{ensure, TwError, TwResult};

// ============================================================
// 交错位置
// ============================================================

/// 交错位置枚举
///
/// 标识一个场在交错网格上的落点，决定分类与插值使用的坐标数组。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StaggerLocation {
    /// x 方向速度分量位置 (xh, y, z)
    U,
    /// y 方向速度分量位置 (x, yh, z)
    V,
    /// z 方向速度分量位置 (x, y, zh)
    W,
    /// 标量位置（单元中心）
    #[default]
    Center,
}

impl StaggerLocation {
    /// 位置名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::U => "u",
            Self::V => "v",
            Self::W => "w",
            Self::Center => "center",
        }
    }

    /// 是否为速度分量位置
    #[inline]
    pub fn is_velocity(&self) -> bool {
        !matches!(self, Self::Center)
    }
}

// ============================================================
// 结构化网格
// ============================================================

/// 结构化交错网格元数据
///
/// 持有本进程子域的索引范围、展平步长与物理坐标。
/// 坐标数组长度与含 halo 的单元数一致。
#[derive(Debug, Clone)]
pub struct StructuredGrid {
    /// x 方向内部单元数
    pub itot: usize,
    /// y 方向内部单元数
    pub jtot: usize,
    /// z 方向内部单元数
    pub ktot: usize,

    /// 水平 halo 宽度
    pub igc: usize,
    /// y 方向 halo 宽度
    pub jgc: usize,
    /// 垂直 halo 宽度
    pub kgc: usize,

    /// x 方向总单元数（含 halo）
    pub icells: usize,
    /// y 方向总单元数（含 halo）
    pub jcells: usize,
    /// z 方向总单元数（含 halo）
    pub kcells: usize,
    /// 单个 k 层的单元数，即展平步长
    pub ijcells: usize,

    /// 内部区域起始索引 (x)
    pub istart: usize,
    /// 内部区域结束索引 (x，开区间)
    pub iend: usize,
    /// 内部区域起始索引 (y)
    pub jstart: usize,
    /// 内部区域结束索引 (y，开区间)
    pub jend: usize,
    /// 内部区域起始索引 (z)
    pub kstart: usize,
    /// 内部区域结束索引 (z，开区间)
    pub kend: usize,

    /// 域尺寸 (x) [m]
    pub xsize: f64,
    /// 域尺寸 (y) [m]
    pub ysize: f64,
    /// 域尺寸 (z) [m]
    pub zsize: f64,

    /// 水平网格距 (x) [m]
    pub dx: f64,
    /// 水平网格距 (y) [m]
    pub dy: f64,

    /// 单元中心坐标 (x)
    pub x: Vec<f64>,
    /// 面心坐标 (x)
    pub xh: Vec<f64>,
    /// 单元中心坐标 (y)
    pub y: Vec<f64>,
    /// 面心坐标 (y)
    pub yh: Vec<f64>,
    /// 单元中心坐标 (z)
    pub z: Vec<f64>,
    /// 面心坐标 (z)
    pub zh: Vec<f64>,
}

impl StructuredGrid {
    /// 创建等距网格（接口夹具）
    ///
    /// # 参数
    /// - `itot`/`jtot`/`ktot`: 内部单元数
    /// - `xsize`/`ysize`/`zsize`: 物理域尺寸 [m]
    /// - `gc`: 各方向 halo 宽度
    pub fn equidistant(
        itot: usize,
        jtot: usize,
        ktot: usize,
        xsize: f64,
        ysize: f64,
        zsize: f64,
        gc: usize,
    ) -> TwResult<Self> {
        ensure!(
            itot > 0 && jtot > 0 && ktot > 0,
            TwError::invalid_input("网格各方向内部单元数必须大于零")
        );
        ensure!(
            xsize > 0.0 && ysize > 0.0 && zsize > 0.0,
            TwError::invalid_input("网格物理尺寸必须大于零")
        );

        let icells = itot + 2 * gc;
        let jcells = jtot + 2 * gc;
        let kcells = ktot + 2 * gc;
        let ijcells = icells * jcells;

        let istart = gc;
        let iend = itot + gc;
        let jstart = gc;
        let jend = jtot + gc;
        let kstart = gc;
        let kend = ktot + gc;

        let dx = xsize / itot as f64;
        let dy = ysize / jtot as f64;
        let dz = zsize / ktot as f64;

        let mut x = vec![0.0; icells];
        let mut xh = vec![0.0; icells];
        for i in 0..icells {
            x[i] = (i as f64 - istart as f64 + 0.5) * dx;
            xh[i] = (i as f64 - istart as f64) * dx;
        }

        let mut y = vec![0.0; jcells];
        let mut yh = vec![0.0; jcells];
        for j in 0..jcells {
            y[j] = (j as f64 - jstart as f64 + 0.5) * dy;
            yh[j] = (j as f64 - jstart as f64) * dy;
        }

        let mut z = vec![0.0; kcells];
        let mut zh = vec![0.0; kcells];
        for k in 0..kcells {
            z[k] = (k as f64 - kstart as f64 + 0.5) * dz;
            zh[k] = (k as f64 - kstart as f64) * dz;
        }

        Ok(Self {
            itot,
            jtot,
            ktot,
            igc: gc,
            jgc: gc,
            kgc: gc,
            icells,
            jcells,
            kcells,
            ijcells,
            istart,
            iend,
            jstart,
            jend,
            kstart,
            kend,
            xsize,
            ysize,
            zsize,
            dx,
            dy,
            x,
            xh,
            y,
            yh,
            z,
            zh,
        })
    }

    /// 含 halo 的总单元数
    #[inline]
    pub fn ncells(&self) -> usize {
        self.icells * self.jcells * self.kcells
    }

    /// 展平索引
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.icells + k * self.ijcells
    }

    /// 给定交错位置的坐标数组 (xs, ys, zs)
    #[inline]
    pub fn stagger_coords(&self, location: StaggerLocation) -> (&[f64], &[f64], &[f64]) {
        match location {
            StaggerLocation::U => (&self.xh, &self.y, &self.z),
            StaggerLocation::V => (&self.x, &self.yh, &self.z),
            StaggerLocation::W => (&self.x, &self.y, &self.zh),
            StaggerLocation::Center => (&self.x, &self.y, &self.z),
        }
    }

    /// 最小垂直网格距（内部区域）
    pub fn dz_min(&self) -> f64 {
        let mut dz_min = f64::MAX;
        for k in self.kstart..self.kend {
            let dz = self.zh[k + 1] - self.zh[k];
            if dz < dz_min {
                dz_min = dz;
            }
        }
        dz_min
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equidistant_layout() {
        let grid = StructuredGrid::equidistant(8, 4, 6, 800.0, 400.0, 300.0, 1).unwrap();

        assert_eq!(grid.icells, 10);
        assert_eq!(grid.jcells, 6);
        assert_eq!(grid.ijcells, 60);
        assert_eq!(grid.istart, 1);
        assert_eq!(grid.iend, 9);

        // 内部第一个中心点位于半网格距处
        assert!((grid.x[grid.istart] - 50.0).abs() < 1e-12);
        // 面心与域边界对齐
        assert!((grid.xh[grid.istart] - 0.0).abs() < 1e-12);
        assert!((grid.zh[grid.kstart] - 0.0).abs() < 1e-12);
        assert!((grid.zh[grid.kend] - 300.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_stride() {
        let grid = StructuredGrid::equidistant(4, 4, 4, 1.0, 1.0, 1.0, 2).unwrap();
        let ijk = grid.index(3, 2, 1);
        assert_eq!(ijk, 3 + 2 * grid.icells + grid.ijcells);
    }

    #[test]
    fn test_stagger_coords() {
        let grid = StructuredGrid::equidistant(4, 4, 4, 1.0, 1.0, 1.0, 1).unwrap();
        let (xs, _, zs) = grid.stagger_coords(StaggerLocation::U);
        assert!((xs[grid.istart] - 0.0).abs() < 1e-12);
        assert!(zs[grid.kstart] > 0.0);

        let (_, _, zs_w) = grid.stagger_coords(StaggerLocation::W);
        assert!((zs_w[grid.kstart] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(StructuredGrid::equidistant(0, 4, 4, 1.0, 1.0, 1.0, 1).is_err());
        assert!(StructuredGrid::equidistant(4, 4, 4, -1.0, 1.0, 1.0, 1).is_err());
    }

    #[test]
    fn test_dz_min() {
        let grid = StructuredGrid::equidistant(4, 4, 10, 1.0, 1.0, 100.0, 1).unwrap();
        assert!((grid.dz_min() - 10.0).abs() < 1e-12);
    }
}
