// apps/tw_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 在不启动模拟的情况下检查配置文件：serde 解析、各配置段的
//! 取值校验，以及积分器构造期的定点时间检查（起始/保存时间与
//! IO 精度对齐、步长取整非零）。

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use tw_config::{CoreConfig, RunMode};
use tw_physics::Timeloop;

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 运行模式 (init, run, post)
    #[arg(short, long, default_value = "run")]
    pub mode: String,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== TerraWind 配置验证 ===");

    let mode = match args.mode.to_lowercase().as_str() {
        "init" => RunMode::Init,
        "run" => RunMode::Run,
        "post" => RunMode::Post,
        other => bail!("未知的运行模式: {other}"),
    };

    let config = CoreConfig::from_path(&args.config)
        .with_context(|| format!("读取配置文件 {} 失败", args.config.display()))?;

    config
        .validate(mode)
        .context("配置取值校验失败")?;

    // 定点时间相关检查在积分器构造期完成
    Timeloop::new(&config.time, mode).context("时间配置无法构造积分器")?;

    println!("✓ 配置有效: {}", args.config.display());
    println!("  模式: {mode}");
    println!("  边界类型: {}", config.boundary.boundary_type);
    println!("  rkorder: {}", config.time.rkorder);
    println!("  endtime: {} s, savetime: {} s", config.time.endtime, config.time.savetime);

    Ok(())
}
