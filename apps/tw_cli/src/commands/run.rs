// apps/tw_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 在浸没地形上驱动完整的外层时间循环。真实求解器中由
//! 平流/扩散/压力协作者提供倾向；这里用朝背景值的弛豫倾向
//! 占位，完整走过 倾向 → 边界倾向改写 → RK 级内更新 →
//! 边界场值重构 → 时间簿记 → 检查点 的链路。

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use tw_config::{CoreConfig, RunMode};
use tw_physics::{ImmersedBoundary, Timeloop};
use tw_runtime::{FieldStore, SingleProcess, StaggerLocation, StructuredGrid};

/// 内置演示配置：正弦地形上的弛豫驱动
const DEMO_CONFIG: &str = r#"{
    "time": {
        "starttime": 0.0,
        "endtime": 60.0,
        "savetime": 30.0,
        "adaptivestep": true,
        "dtmax": 5.0,
        "rkorder": 3,
        "outputiter": 5
    },
    "boundary": {
        "boundary_type": "sine",
        "amplitude": 100.0,
        "z_offset": 150.0,
        "wavelength_x": 1600.0,
        "n_neighbours": 8,
        "sbot": 1.0
    }
}"#;

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（缺省使用内置正弦地形演示配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 检查点输出目录
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// 水平单元数 (x)
    #[arg(long, default_value = "32")]
    pub itot: usize,

    /// 水平单元数 (y)
    #[arg(long, default_value = "8")]
    pub jtot: usize,

    /// 垂直单元数
    #[arg(long, default_value = "32")]
    pub ktot: usize,

    /// 域尺寸 (x) [m]
    #[arg(long, default_value = "3200.0")]
    pub xsize: f64,

    /// 域尺寸 (y) [m]
    #[arg(long, default_value = "800.0")]
    pub ysize: f64,

    /// 域尺寸 (z) [m]
    #[arg(long, default_value = "1600.0")]
    pub zsize: f64,

    /// 占位倾向的弛豫时间尺度 [s]
    #[arg(long, default_value = "100.0")]
    pub tau: f64,

    /// 墙钟预算 [s]（超出后在 IO 精度边界保存并停机）
    #[arg(long)]
    pub wall_clock_limit: Option<f64>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== TerraWind 模拟启动 ===");

    let config = match &args.config {
        Some(path) => CoreConfig::from_path(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?,
        None => serde_json::from_str(DEMO_CONFIG).context("内置演示配置解析失败")?,
    };
    config.validate(RunMode::Run).context("配置校验失败")?;

    let grid = StructuredGrid::equidistant(
        args.itot, args.jtot, args.ktot, args.xsize, args.ysize, args.zsize, 1,
    )
    .context("构建网格失败")?;
    info!(
        "网格: {}x{}x{} 单元, 域 {}x{}x{} m",
        grid.itot, grid.jtot, grid.ktot, grid.xsize, grid.ysize, grid.zsize
    );

    let coord = match args.wall_clock_limit {
        Some(budget) => SingleProcess::with_wall_clock_budget(budget),
        None => SingleProcess::new(),
    };

    let ib = ImmersedBoundary::from_config(&config.boundary, &grid).context("构建浸没边界失败")?;
    info!("浸没边界: {} 地形", ib.shape().name());

    let mut timeloop = Timeloop::new(&config.time, RunMode::Run).context("构建时间积分器失败")?;
    info!(
        "时间积分: {}, endtime={} s, savetime={} s",
        timeloop.rkorder(),
        config.time.endtime,
        config.time.savetime
    );

    let mut fields = FieldStore::new();
    fields.register("u", StaggerLocation::U, grid.ncells())?;
    fields.register("v", StaggerLocation::V, grid.ncells())?;
    fields.register("w", StaggerLocation::W, grid.ncells())?;
    fields.register("th", StaggerLocation::Center, grid.ncells())?;

    for field in fields.iter_mut() {
        let background = match field.location {
            StaggerLocation::Center => 5.0,
            _ => 2.0,
        };
        field.data.fill(background);
    }

    // 初始场同样满足边界条件
    ib.apply_fields(&grid, &mut fields)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("创建输出目录 {} 失败", args.output.display()))?;

    let start = Instant::now();
    let mut saves = 0;

    while !timeloop.is_finished() {
        timeloop.set_time_step_limit(&coord);
        // 显式弛豫的稳定性约束充当外部 CFL 限制
        timeloop.impose_cfl_limit(0.5 * args.tau);
        timeloop.set_time_step()?;

        // 子步循环：倾向 → 边界倾向改写 → RK 更新 → 边界场值重构
        loop {
            relax_tendencies(&mut fields, args.tau);
            ib.apply_tendencies(&grid, &mut fields)?;
            timeloop.exec(&grid, &mut fields);
            ib.apply_fields(&grid, &mut fields)?;

            if !timeloop.in_substep() {
                break;
            }
        }

        timeloop.step_time();
        ib.log_summary(timeloop.in_substep());

        if timeloop.do_check() {
            let elapsed = timeloop.check();
            info!(
                "iter={:5} t={:9.2} s dt={:7.4} s 区间耗时={:.3} s",
                timeloop.iteration(),
                timeloop.time(),
                timeloop.dt(),
                elapsed
            );
        }

        if timeloop.do_save(&coord) {
            timeloop.save(&coord, &args.output, timeloop.iotime())?;
            saves += 1;
        }
    }

    let elapsed = start.elapsed();
    info!("=== 模拟完成 ===");
    info!("总迭代: {}", timeloop.iteration());
    info!("模拟时间: {:.2} s", timeloop.time());
    info!("检查点: {} 个", saves);
    info!("计算耗时: {:.2} s", elapsed.as_secs_f64());

    Ok(())
}

/// 占位倾向协作者：朝零的弛豫，累加在积分器缩放后的旧倾向上
fn relax_tendencies(fields: &mut FieldStore, tau: f64) {
    let inv_tau = 1.0 / tau;
    for field in fields.iter_mut() {
        let (data, tend) = field.arrays_mut();
        for (t, v) in tend.iter_mut().zip(data.iter()) {
            *t += -inv_tau * v;
        }
    }
}
