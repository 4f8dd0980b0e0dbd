// crates/tw_config/src/time.rs

//! 时间推进配置
//!
//! 定义时间积分器消费的全部配置参数。
//! 整数定点时间的换算与"精确倍数"检查在积分器构造时完成，
//! 本模块只做与缩放因子无关的取值校验。

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use tw_foundation::constants::DBIG;

// ============================================================
// 运行模式
// ============================================================

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// 初始化：starttime 强制为 0，不要求配置提供
    Init,
    /// 正常推进
    #[default]
    Run,
    /// 后处理：按 postproctime 间隔跳步
    Post,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Run => write!(f, "run"),
            Self::Post => write!(f, "post"),
        }
    }
}

// ============================================================
// 时间配置
// ============================================================

/// 时间推进配置
///
/// 必选项：`endtime`、`savetime`，以及非 init 模式下的 `starttime`、
/// post 模式下的 `postproctime`。其余项带默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间 [s]（init 模式外必选）
    #[serde(default)]
    pub starttime: Option<f64>,

    /// 结束时间 [s]
    pub endtime: f64,

    /// 检查点保存间隔 [s]
    pub savetime: f64,

    /// 是否启用自适应步长
    #[serde(default = "default_adaptivestep")]
    pub adaptivestep: bool,

    /// 步长上限 [s]
    #[serde(default = "default_dtmax")]
    pub dtmax: f64,

    /// 初始步长 [s]（缺省取 dtmax）
    #[serde(default)]
    pub dt: Option<f64>,

    /// Runge-Kutta 阶数（仅 3 或 4）
    #[serde(default = "default_rkorder")]
    pub rkorder: u8,

    /// 诊断输出的迭代间隔
    #[serde(default = "default_outputiter")]
    pub outputiter: u32,

    /// IO 时间精度指数：精度单位为 10^iotimeprec 秒
    #[serde(default)]
    pub iotimeprec: i32,

    /// 后处理时间间隔 [s]（post 模式必选）
    #[serde(default)]
    pub postproctime: Option<f64>,
}

fn default_adaptivestep() -> bool {
    true
}

fn default_dtmax() -> f64 {
    DBIG
}

fn default_rkorder() -> u8 {
    3
}

fn default_outputiter() -> u32 {
    20
}

impl TimeConfig {
    /// 有效初始步长：未配置时取 dtmax
    #[inline]
    pub fn effective_dt(&self) -> f64 {
        self.dt.unwrap_or(self.dtmax)
    }

    /// 有效起始时间：init 模式下强制为 0
    pub fn effective_starttime(&self, mode: RunMode) -> ConfigResult<f64> {
        match mode {
            RunMode::Init => Ok(0.0),
            _ => self.starttime.ok_or(ConfigError::MissingKey { key: "starttime" }),
        }
    }

    /// 取值校验
    ///
    /// 与定点缩放相关的检查（starttime/savetime 是否为 IO 精度单位的
    /// 精确倍数、步长取整后是否为零）在积分器构造时完成。
    pub fn validate(&self, mode: RunMode) -> ConfigResult<()> {
        if !(self.rkorder == 3 || self.rkorder == 4) {
            return Err(ConfigError::invalid_value(
                "rkorder",
                self.rkorder,
                "仅支持 3 或 4",
            ));
        }

        if self.endtime <= 0.0 {
            return Err(ConfigError::invalid_value(
                "endtime",
                self.endtime,
                "必须大于零",
            ));
        }

        if self.savetime <= 0.0 {
            return Err(ConfigError::invalid_value(
                "savetime",
                self.savetime,
                "必须大于零",
            ));
        }

        if self.dtmax <= 0.0 {
            return Err(ConfigError::invalid_value(
                "dtmax",
                self.dtmax,
                "必须大于零",
            ));
        }

        if let Some(dt) = self.dt {
            if dt <= 0.0 {
                return Err(ConfigError::invalid_value("dt", dt, "必须大于零"));
            }
        }

        if self.outputiter == 0 {
            return Err(ConfigError::invalid_value(
                "outputiter",
                self.outputiter,
                "必须大于零",
            ));
        }

        self.effective_starttime(mode)?;

        if mode == RunMode::Post && self.postproctime.is_none() {
            return Err(ConfigError::MissingKey {
                key: "postproctime",
            });
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

    fn base_config() -> TimeConfig {
        TimeConfig {
            starttime: Some(0.0),
            endtime: 3600.0,
            savetime: 600.0,
            adaptivestep: true,
            dtmax: DBIG,
            dt: None,
            rkorder: 3,
            outputiter: 20,
            iotimeprec: 0,
            postproctime: None,
        }
    }

    #[test]
    fn test_defaults_from_json() {
        let json = r#"{"starttime": 0.0, "endtime": 100.0, "savetime": 50.0}"#;
        let config: TimeConfig = serde_json::from_str(json).unwrap();

        assert!(config.adaptivestep);
        assert_eq!(config.rkorder, 3);
        assert_eq!(config.outputiter, 20);
        assert_eq!(config.iotimeprec, 0);
        assert!((config.effective_dt() - DBIG).abs() < 1e-6);
    }

    #[test]
    fn test_missing_endtime_fails() {
        let json = r#"{"starttime": 0.0, "savetime": 50.0}"#;
        assert!(serde_json::from_str::<TimeConfig>(json).is_err());
    }

    #[test]
    fn test_illegal_rkorder() {
        let mut config = base_config();
        config.rkorder = 5;
        assert!(config.validate(RunMode::Run).is_err());

        config.rkorder = 4;
        assert!(config.validate(RunMode::Run).is_ok());
    }

    #[test]
    fn test_starttime_obligatory_outside_init() {
        let mut config = base_config();
        config.starttime = None;
        assert!(config.validate(RunMode::Run).is_err());
        // init 模式下 starttime 强制为 0
        assert!(config.validate(RunMode::Init).is_ok());
        assert!((config.effective_starttime(RunMode::Init).unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_postproctime_obligatory_in_post() {
        let mut config = base_config();
        assert!(config.validate(RunMode::Post).is_err());
        config.postproctime = Some(300.0);
        assert!(config.validate(RunMode::Post).is_ok());
    }
}
