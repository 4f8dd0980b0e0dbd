// crates/tw_physics/src/boundary/geometry.rs

//! 浸没边界几何描述
//!
//! 本模块提供浸没表面的纯函数式描述：
//! - BoundaryShape: 参数化形状的封闭枚举（运行时分发）
//! - Dimensionality: 水平维数标志
//! - ElevationProvider: 用户自定义高程的外部数据源接口
//! - TabulatedElevation: 数据表高程实现（一维剖面 / 二维栅格）
//!
//! # 契约
//!
//! 给定水平位置 (x[, y]) 返回边界的垂直高程。无副作用、确定性、
//! 开销低——分类阶段对每个网格点求值，接口也不排除将来
//! 每步求值（移动边界）。
//!
//! 形状按类型在运行时分发：每个分支独立、可单测，
//! 避免按形状×维数组合实例化代码路径。

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use super::BoundaryError;

// ============================================================
// 水平维数
// ============================================================

/// 水平维数标志
///
/// 一维形状只随 x 变化，y 方向为平移不变；二维形状随 (x, y) 变化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimensionality {
    /// 仅 x 方向起伏
    #[default]
    One,
    /// x 与 y 方向起伏
    Two,
}

impl Dimensionality {
    /// 从配置的整数值转换
    pub fn from_config(xy_dims: u8) -> Result<Self, BoundaryError> {
        match xy_dims {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(BoundaryError::InvalidShape(format!(
                "非法的水平维数 {other}, 仅支持 1 或 2"
            ))),
        }
    }

    /// 是否为二维
    #[inline]
    pub fn is_two_d(&self) -> bool {
        matches!(self, Self::Two)
    }
}

// ============================================================
// 用户自定义高程接口
// ============================================================

/// 用户自定义高程数据源
///
/// 几何组件只依赖统一的查询签名；数据本身（表格、文件、外部服务）
/// 属于外部协作者。实现必须是确定性的。
pub trait ElevationProvider: Send + Sync + fmt::Debug {
    /// 水平位置 (x, y) 处的边界高程 [m]
    fn elevation(&self, x: f64, y: f64) -> f64;
}

// ============================================================
// 形状枚举
// ============================================================

/// 浸没边界形状
///
/// 封闭变体集合，构造自配置后不可变。每个变体只携带自己需要的
/// 标量参数。
#[derive(Debug, Clone)]
pub enum BoundaryShape {
    /// 平坦边界：高程为常数偏移（退化/测试用例）
    None {
        /// 垂直偏移 [m]
        z_offset: f64,
    },

    /// 正弦地形
    Sine {
        /// 幅度 [m]
        amplitude: f64,
        /// 垂直偏移 [m]
        z_offset: f64,
        /// 波长 (x) [m]
        wavelength_x: f64,
        /// 波长 (y) [m]，仅二维使用
        wavelength_y: f64,
        /// 水平维数
        dims: Dimensionality,
    },

    /// 高斯山丘
    Gaussian {
        /// 幅度 [m]
        amplitude: f64,
        /// 垂直偏移 [m]
        z_offset: f64,
        /// 中心 (x) [m]
        x0: f64,
        /// 中心 (y) [m]
        y0: f64,
        /// 展布 (x) [m]
        sigma_x: f64,
        /// 展布 (y) [m]
        sigma_y: f64,
        /// 水平维数
        dims: Dimensionality,
    },

    /// 矩形台块（陡坎，不光滑）
    Block {
        /// 台块高度 [m]
        amplitude: f64,
        /// 垂直偏移 [m]
        z_offset: f64,
        /// 足印中心 (x) [m]
        x0: f64,
        /// 足印中心 (y) [m]
        y0: f64,
        /// 足印半宽 (x) [m]
        half_x: f64,
        /// 足印半宽 (y) [m]
        half_y: f64,
        /// 水平维数
        dims: Dimensionality,
    },

    /// 用户自定义：高程由外部数据源提供
    User {
        /// 高程数据源
        provider: Arc<dyn ElevationProvider>,
    },
}

impl BoundaryShape {
    /// 水平位置处的边界高程 [m]
    ///
    /// 一维形状忽略 y。
    pub fn elevation(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::None { z_offset } => *z_offset,

            Self::Sine {
                amplitude,
                z_offset,
                wavelength_x,
                wavelength_y,
                dims,
            } => {
                let sx = (TAU * x / wavelength_x).sin();
                match dims {
                    Dimensionality::One => z_offset + amplitude * sx,
                    Dimensionality::Two => {
                        z_offset + amplitude * sx * (TAU * y / wavelength_y).sin()
                    }
                }
            }

            Self::Gaussian {
                amplitude,
                z_offset,
                x0,
                y0,
                sigma_x,
                sigma_y,
                dims,
            } => {
                let mut arg = (x - x0).powi(2) / (2.0 * sigma_x * sigma_x);
                if dims.is_two_d() {
                    arg += (y - y0).powi(2) / (2.0 * sigma_y * sigma_y);
                }
                z_offset + amplitude * (-arg).exp()
            }

            Self::Block {
                amplitude,
                z_offset,
                x0,
                y0,
                half_x,
                half_y,
                dims,
            } => {
                let inside_x = (x - x0).abs() <= *half_x;
                let inside = match dims {
                    Dimensionality::One => inside_x,
                    Dimensionality::Two => inside_x && (y - y0).abs() <= *half_y,
                };
                if inside {
                    z_offset + amplitude
                } else {
                    *z_offset
                }
            }

            Self::User { provider } => provider.elevation(x, y),
        }
    }

    /// 水平维数
    pub fn dims(&self) -> Dimensionality {
        match self {
            Self::None { .. } => Dimensionality::One,
            Self::Sine { dims, .. } | Self::Gaussian { dims, .. } | Self::Block { dims, .. } => {
                *dims
            }
            Self::User { .. } => Dimensionality::Two,
        }
    }

    /// 最近边界点搜索的水平半宽 [m]
    ///
    /// 返回形状自身的水平尺度；无固有尺度的形状（平坦、用户表）
    /// 回退到调用方给定的网格尺度。
    pub fn search_halfwidth(&self, fallback: f64) -> f64 {
        match self {
            Self::None { .. } => fallback,
            Self::Sine { wavelength_x, .. } => 0.5 * wavelength_x,
            Self::Gaussian { sigma_x, .. } => 3.0 * sigma_x,
            Self::Block { half_x, .. } => half_x + fallback,
            Self::User { .. } => fallback,
        }
    }

    /// 形状名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::None { .. } => "none",
            Self::Sine { .. } => "sine",
            Self::Gaussian { .. } => "gaussian",
            Self::Block { .. } => "block",
            Self::User { .. } => "user",
        }
    }
}

// ============================================================
// 数据表高程
// ============================================================

/// 数据表高程源
///
/// 一维剖面 (x → 高程，线性插值) 或二维栅格 (双线性插值)。
/// 查询位置超出表范围时钳制到边缘值。
#[derive(Debug, Clone)]
pub struct TabulatedElevation {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Vec<f64>,
}

impl TabulatedElevation {
    /// 从一维剖面创建
    ///
    /// # 参数
    /// - `xs`: 严格递增的 x 坐标
    /// - `values`: 对应高程，长度与 `xs` 一致
    pub fn profile(xs: Vec<f64>, values: Vec<f64>) -> Result<Self, BoundaryError> {
        Self::grid(xs, vec![0.0], values)
    }

    /// 从二维栅格创建
    ///
    /// # 参数
    /// - `xs`: 严格递增的 x 坐标
    /// - `ys`: 严格递增的 y 坐标
    /// - `values`: 行优先存储的高程，长度为 `xs.len() * ys.len()`
    pub fn grid(xs: Vec<f64>, ys: Vec<f64>, values: Vec<f64>) -> Result<Self, BoundaryError> {
        if xs.is_empty() || ys.is_empty() {
            return Err(BoundaryError::InvalidElevationTable(
                "坐标数组不能为空".into(),
            ));
        }
        if values.len() != xs.len() * ys.len() {
            return Err(BoundaryError::InvalidElevationTable(format!(
                "高程数组长度 {} 与栅格 {}x{} 不符",
                values.len(),
                xs.len(),
                ys.len()
            )));
        }
        if !is_strictly_ascending(&xs) || !is_strictly_ascending(&ys) {
            return Err(BoundaryError::InvalidElevationTable(
                "坐标数组必须严格递增".into(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BoundaryError::InvalidElevationTable(
                "高程值必须有限".into(),
            ));
        }

        Ok(Self { xs, ys, values })
    }

    /// 从 CSV 剖面文件创建
    ///
    /// 每行 `x,高程`，`#` 开头的行与空行被忽略。
    pub fn from_profile_csv(path: &std::path::Path) -> Result<Self, BoundaryError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BoundaryError::InvalidElevationTable(format!("无法读取 {}: {e}", path.display()))
        })?;

        let mut xs = Vec::new();
        let mut values = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split(',');
            let x: f64 = parse_field(parts.next(), path, lineno)?;
            let v: f64 = parse_field(parts.next(), path, lineno)?;
            xs.push(x);
            values.push(v);
        }

        Self::profile(xs, values)
    }

    fn bracket(coords: &[f64], v: f64) -> (usize, usize, f64) {
        if v <= coords[0] {
            return (0, 0, 0.0);
        }
        let last = coords.len() - 1;
        if v >= coords[last] {
            return (last, last, 0.0);
        }
        let hi = coords.partition_point(|&c| c <= v);
        let lo = hi - 1;
        let frac = (v - coords[lo]) / (coords[hi] - coords[lo]);
        (lo, hi, frac)
    }

    #[inline]
    fn value_at(&self, ix: usize, iy: usize) -> f64 {
        self.values[iy * self.xs.len() + ix]
    }
}

fn is_strictly_ascending(coords: &[f64]) -> bool {
    coords.windows(2).all(|w| w[0] < w[1])
}

fn parse_field(
    field: Option<&str>,
    path: &std::path::Path,
    lineno: usize,
) -> Result<f64, BoundaryError> {
    field
        .map(str::trim)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            BoundaryError::InvalidElevationTable(format!(
                "{} 第{}行格式错误",
                path.display(),
                lineno + 1
            ))
        })
}

impl ElevationProvider for TabulatedElevation {
    fn elevation(&self, x: f64, y: f64) -> f64 {
        let (ix0, ix1, fx) = Self::bracket(&self.xs, x);
        let (iy0, iy1, fy) = Self::bracket(&self.ys, y);

        let v00 = self.value_at(ix0, iy0);
        let v10 = self.value_at(ix1, iy0);
        let v01 = self.value_at(ix0, iy1);
        let v11 = self.value_at(ix1, iy1);

        let lo = v00 + fx * (v10 - v00);
        let hi = v01 + fx * (v11 - v01);
        lo + fy * (hi - lo)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_elevation() {
        let shape = BoundaryShape::None { z_offset: 12.5 };
        assert!((shape.elevation(0.0, 0.0) - 12.5).abs() < 1e-12);
        assert!((shape.elevation(1e6, -1e6) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_sine_one_d() {
        let shape = BoundaryShape::Sine {
            amplitude: 10.0,
            z_offset: 5.0,
            wavelength_x: 100.0,
            wavelength_y: 0.0,
            dims: Dimensionality::One,
        };
        // 四分之一波长处达到峰值
        assert!((shape.elevation(25.0, 0.0) - 15.0).abs() < 1e-10);
        // y 方向平移不变
        assert!((shape.elevation(25.0, 42.0) - 15.0).abs() < 1e-10);
        assert!((shape.elevation(0.0, 0.0) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_sine_two_d() {
        let shape = BoundaryShape::Sine {
            amplitude: 10.0,
            z_offset: 0.0,
            wavelength_x: 100.0,
            wavelength_y: 200.0,
            dims: Dimensionality::Two,
        };
        // 双向均在峰值
        assert!((shape.elevation(25.0, 50.0) - 10.0).abs() < 1e-10);
        // y 过零点时高程回到偏移
        assert!(shape.elevation(25.0, 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_gaussian_hill() {
        let shape = BoundaryShape::Gaussian {
            amplitude: 50.0,
            z_offset: 2.0,
            x0: 500.0,
            y0: 0.0,
            sigma_x: 100.0,
            sigma_y: 100.0,
            dims: Dimensionality::One,
        };
        // 中心处为偏移加幅度
        assert!((shape.elevation(500.0, 0.0) - 52.0).abs() < 1e-10);
        // 一个 sigma 处按 exp(-1/2) 衰减
        let expected = 2.0 + 50.0 * (-0.5f64).exp();
        assert!((shape.elevation(600.0, 0.0) - expected).abs() < 1e-10);
        // 远处趋于偏移
        assert!((shape.elevation(5000.0, 0.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_block_sharp_step() {
        let shape = BoundaryShape::Block {
            amplitude: 20.0,
            z_offset: 1.0,
            x0: 0.0,
            y0: 0.0,
            half_x: 50.0,
            half_y: 30.0,
            dims: Dimensionality::Two,
        };
        assert!((shape.elevation(0.0, 0.0) - 21.0).abs() < 1e-12);
        assert!((shape.elevation(49.9, 29.9) - 21.0).abs() < 1e-12);
        // 足印外立即回到偏移（陡坎，不光滑）
        assert!((shape.elevation(50.1, 0.0) - 1.0).abs() < 1e-12);
        assert!((shape.elevation(0.0, 30.1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tabulated_profile() {
        let table =
            TabulatedElevation::profile(vec![0.0, 10.0, 20.0], vec![1.0, 3.0, 2.0]).unwrap();
        let shape = BoundaryShape::User {
            provider: Arc::new(table),
        };

        assert!((shape.elevation(0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((shape.elevation(5.0, 0.0) - 2.0).abs() < 1e-12);
        // 范围外钳制
        assert!((shape.elevation(-5.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((shape.elevation(100.0, 0.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tabulated_grid_bilinear() {
        let table = TabulatedElevation::grid(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        // 四角
        assert!((table.elevation(0.0, 0.0) - 0.0).abs() < 1e-12);
        assert!((table.elevation(1.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((table.elevation(0.0, 1.0) - 2.0).abs() < 1e-12);
        // 中心为四角均值
        assert!((table.elevation(0.5, 0.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_tabulated_validation() {
        // 非递增坐标
        assert!(TabulatedElevation::profile(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        // 长度不匹配
        assert!(TabulatedElevation::grid(vec![0.0, 1.0], vec![0.0], vec![1.0]).is_err());
        // 空表
        assert!(TabulatedElevation::profile(vec![], vec![]).is_err());
    }

    #[test]
    fn test_search_halfwidth() {
        let sine = BoundaryShape::Sine {
            amplitude: 1.0,
            z_offset: 0.0,
            wavelength_x: 100.0,
            wavelength_y: 100.0,
            dims: Dimensionality::One,
        };
        assert!((sine.search_halfwidth(1.0) - 50.0).abs() < 1e-12);

        let flat = BoundaryShape::None { z_offset: 0.0 };
        assert!((flat.search_halfwidth(7.5) - 7.5).abs() < 1e-12);
    }
}
