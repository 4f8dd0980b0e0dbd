// crates/tw_config/src/boundary.rs

//! 浸没边界配置
//!
//! 定义幽灵单元浸没边界层消费的全部配置参数：
//! 边界类型选择器、形状参数与重构模板大小。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// ============================================================
// 边界类型选择器
// ============================================================

/// 浸没边界类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    /// 无地形：平坦边界（退化/测试用例）
    #[default]
    None,
    /// 正弦地形
    Sine,
    /// 高斯山丘
    Gaussian,
    /// 矩形台块（陡坎，不光滑）
    Block,
    /// 用户自定义：高程由外部数据表提供
    User,
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Sine => write!(f, "sine"),
            Self::Gaussian => write!(f, "gaussian"),
            Self::Block => write!(f, "block"),
            Self::User => write!(f, "user"),
        }
    }
}

// ============================================================
// 浸没边界配置
// ============================================================

/// 模板点数下限：一次多项式基 [1, x, y, z] 加边界点约束
/// 至少需要 3 个流体模板点才可能适定
const MIN_NEIGHBOURS: usize = 3;

/// 浸没边界配置
///
/// 形状专属参数仅在对应类型下校验；未用到的参数被忽略。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmersedBoundaryConfig {
    /// 边界类型
    #[serde(default)]
    pub boundary_type: BoundaryType,

    /// 地形幅度 [m]
    #[serde(default)]
    pub amplitude: f64,

    /// 垂直偏移 [m]
    #[serde(default)]
    pub z_offset: f64,

    /// 水平维数：1 (仅 x) 或 2 (x 与 y)
    #[serde(default = "default_xy_dims")]
    pub xy_dims: u8,

    /// 正弦波长 (x) [m]
    #[serde(default)]
    pub wavelength_x: f64,

    /// 正弦波长 (y) [m]
    #[serde(default)]
    pub wavelength_y: f64,

    /// 高斯山丘中心 (x) [m]
    #[serde(default)]
    pub x0_hill: f64,

    /// 高斯山丘中心 (y) [m]
    #[serde(default)]
    pub y0_hill: f64,

    /// 高斯山丘展布 (x) [m]
    #[serde(default)]
    pub sigma_x_hill: f64,

    /// 高斯山丘展布 (y) [m]
    #[serde(default)]
    pub sigma_y_hill: f64,

    /// 台块中心 (x) [m]
    #[serde(default)]
    pub x0_block: f64,

    /// 台块中心 (y) [m]
    #[serde(default)]
    pub y0_block: f64,

    /// 台块足印全宽 (x) [m]
    #[serde(default)]
    pub xwidth_block: f64,

    /// 台块足印全宽 (y) [m]
    #[serde(default)]
    pub ywidth_block: f64,

    /// 用户自定义高程表路径（user 类型必选）
    #[serde(default)]
    pub elevation_file: Option<PathBuf>,

    /// 重构模板的流体点数
    #[serde(default = "default_n_neighbours")]
    pub n_neighbours: usize,

    /// 标量场在边界上的 Dirichlet 值
    #[serde(default)]
    pub sbot: f64,
}

fn default_xy_dims() -> u8 {
    1
}

fn default_n_neighbours() -> usize {
    12
}

impl Default for ImmersedBoundaryConfig {
    fn default() -> Self {
        Self {
            boundary_type: BoundaryType::None,
            amplitude: 0.0,
            z_offset: 0.0,
            xy_dims: default_xy_dims(),
            wavelength_x: 0.0,
            wavelength_y: 0.0,
            x0_hill: 0.0,
            y0_hill: 0.0,
            sigma_x_hill: 0.0,
            sigma_y_hill: 0.0,
            x0_block: 0.0,
            y0_block: 0.0,
            xwidth_block: 0.0,
            ywidth_block: 0.0,
            elevation_file: None,
            n_neighbours: default_n_neighbours(),
            sbot: 0.0,
        }
    }
}

impl ImmersedBoundaryConfig {
    /// 取值校验
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.xy_dims == 1 || self.xy_dims == 2) {
            return Err(ConfigError::invalid_value(
                "xy_dims",
                self.xy_dims,
                "仅支持 1 或 2",
            ));
        }

        if self.n_neighbours < MIN_NEIGHBOURS {
            return Err(ConfigError::invalid_value(
                "n_neighbours",
                self.n_neighbours,
                format!("至少需要 {MIN_NEIGHBOURS} 个模板点"),
            ));
        }

        match self.boundary_type {
            BoundaryType::None => {}
            BoundaryType::Sine => {
                if self.wavelength_x <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "wavelength_x",
                        self.wavelength_x,
                        "sine 类型必须大于零",
                    ));
                }
                if self.xy_dims == 2 && self.wavelength_y <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "wavelength_y",
                        self.wavelength_y,
                        "二维 sine 类型必须大于零",
                    ));
                }
            }
            BoundaryType::Gaussian => {
                if self.sigma_x_hill <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "sigma_x_hill",
                        self.sigma_x_hill,
                        "gaussian 类型必须大于零",
                    ));
                }
                if self.xy_dims == 2 && self.sigma_y_hill <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "sigma_y_hill",
                        self.sigma_y_hill,
                        "二维 gaussian 类型必须大于零",
                    ));
                }
            }
            BoundaryType::Block => {
                if self.xwidth_block <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "xwidth_block",
                        self.xwidth_block,
                        "block 类型必须大于零",
                    ));
                }
                if self.xy_dims == 2 && self.ywidth_block <= 0.0 {
                    return Err(ConfigError::invalid_value(
                        "ywidth_block",
                        self.ywidth_block,
                        "二维 block 类型必须大于零",
                    ));
                }
            }
            BoundaryType::User => {
                if self.elevation_file.is_none() {
                    return Err(ConfigError::MissingKey {
                        key: "elevation_file",
                    });
                }
            }
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

    #[test]
    fn test_default_is_valid() {
        let config = ImmersedBoundaryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.boundary_type, BoundaryType::None);
        assert_eq!(config.n_neighbours, 12);
    }

    #[test]
    fn test_selector_from_json() {
        let json = r#"{"boundary_type": "gaussian", "amplitude": 50.0, "sigma_x_hill": 100.0}"#;
        let config: ImmersedBoundaryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.boundary_type, BoundaryType::Gaussian);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sine_requires_wavelength() {
        let mut config = ImmersedBoundaryConfig {
            boundary_type: BoundaryType::Sine,
            amplitude: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.wavelength_x = 200.0;
        assert!(config.validate().is_ok());

        // 二维时还需要 y 波长
        config.xy_dims = 2;
        assert!(config.validate().is_err());
        config.wavelength_y = 200.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_user_requires_elevation_file() {
        let config = ImmersedBoundaryConfig {
            boundary_type: BoundaryType::User,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_illegal_dims() {
        let config = ImmersedBoundaryConfig {
            xy_dims: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stencil_size_floor() {
        let config = ImmersedBoundaryConfig {
            n_neighbours: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
