// crates/tw_config/src/lib.rs

//! TerraWind 配置层 (Layer 4)
//!
//! 提供序列化配置结构与取值校验：
//!
//! - [`time`]: 时间推进配置（步长、保存间隔、RK 阶数、IO 精度）
//! - [`boundary`]: 浸没边界配置（形状选择器与形状参数）
//! - [`error`]: 配置错误类型
//!
//! 所有配置错误都是致命的：在构造阶段检出、带描述性信息中止运行。
//!
//! # 使用示例
//!
//! ```
//! use tw_config::{CoreConfig, RunMode};
//!
//! let json = r#"{
//!     "time": { "starttime": 0.0, "endtime": 3600.0, "savetime": 600.0 },
//!     "boundary": { "boundary_type": "sine", "amplitude": 25.0, "wavelength_x": 500.0 }
//! }"#;
//!
//! let config: CoreConfig = serde_json::from_str(json).unwrap();
//! config.validate(RunMode::Run).unwrap();
//! ```

#![warn(clippy::all)]

pub mod boundary;
pub mod error;
pub mod time;

use std::path::Path;

use serde::{Deserialize, Serialize};

// 重导出常用类型
pub use boundary::{BoundaryType, ImmersedBoundaryConfig};
pub use error::{ConfigError, ConfigResult};
pub use time::{RunMode, TimeConfig};

/// 求解器核心的顶层配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// 时间推进配置
    pub time: TimeConfig,

    /// 浸没边界配置
    #[serde(default)]
    pub boundary: ImmersedBoundaryConfig,
}

impl CoreConfig {
    /// 从 JSON 文件加载
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// 校验全部配置段
    pub fn validate(&self, mode: RunMode) -> ConfigResult<()> {
        self.time.validate(mode)?;
        self.boundary.validate()?;
        Ok(())
    }
}
