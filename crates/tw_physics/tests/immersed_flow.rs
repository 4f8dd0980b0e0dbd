// crates/tw_physics/tests/immersed_flow.rs
//!
//! 浸没边界与时间积分的联合冒烟测试
//!
//! 在正弦地形上驱动完整的外层循环：每个子步先写倾向、
//! 再由浸没边界改写倾向、积分器推进、最后重构幽灵单元场值；
//! 整步边界上做时间簿记、诊断与检查点。

use tw_config::{BoundaryType, ImmersedBoundaryConfig, RunMode, TimeConfig};
use tw_physics::{ImmersedBoundary, Timeloop};
use tw_runtime::{FieldStore, SingleProcess, StaggerLocation, StructuredGrid};

fn terrain_grid() -> StructuredGrid {
    StructuredGrid::equidistant(16, 4, 16, 1600.0, 400.0, 800.0, 1).unwrap()
}

fn sine_config() -> ImmersedBoundaryConfig {
    ImmersedBoundaryConfig {
        boundary_type: BoundaryType::Sine,
        amplitude: 100.0,
        z_offset: 150.0,
        wavelength_x: 800.0,
        n_neighbours: 8,
        sbot: 1.0,
        ..Default::default()
    }
}

fn time_config() -> TimeConfig {
    TimeConfig {
        starttime: Some(0.0),
        endtime: 4.0,
        savetime: 2.0,
        adaptivestep: false,
        dtmax: 10.0,
        dt: Some(1.0),
        rkorder: 3,
        outputiter: 2,
        iotimeprec: 0,
        postproctime: None,
    }
}

fn prognostic_fields(grid: &StructuredGrid) -> FieldStore {
    let mut fields = FieldStore::new();
    fields.register("u", StaggerLocation::U, grid.ncells()).unwrap();
    fields.register("w", StaggerLocation::W, grid.ncells()).unwrap();
    fields
        .register("th", StaggerLocation::Center, grid.ncells())
        .unwrap();

    for field in fields.iter_mut() {
        let background = match field.location {
            StaggerLocation::Center => 5.0,
            _ => 2.0,
        };
        field.data.fill(background);
    }
    fields
}

/// 占位协作者：朝零的弛豫倾向，累加在积分器缩放后的旧倾向上
fn accumulate_tendencies(fields: &mut FieldStore) {
    for field in fields.iter_mut() {
        let (data, tend) = field.arrays_mut();
        for (t, v) in tend.iter_mut().zip(data.iter()) {
            *t += -0.01 * v;
        }
    }
}

#[test]
fn full_loop_over_sine_terrain() {
    let dir = tempfile::tempdir().unwrap();
    let grid = terrain_grid();
    let coord = SingleProcess::new();

    let ib = ImmersedBoundary::from_config(&sine_config(), &grid).unwrap();
    let mut fields = prognostic_fields(&grid);
    let mut timeloop = Timeloop::new(&time_config(), RunMode::Run).unwrap();

    // 地形穿过子域：四份目录都非空
    assert!(!ib.catalog(StaggerLocation::U).is_empty());
    assert!(!ib.catalog(StaggerLocation::V).is_empty());
    assert!(!ib.catalog(StaggerLocation::W).is_empty());
    assert!(!ib.catalog(StaggerLocation::Center).is_empty());

    let mut saves = 0;
    while !timeloop.is_finished() {
        timeloop.set_time_step_limit(&coord);
        timeloop.impose_cfl_limit(5.0);
        timeloop.set_time_step().unwrap();

        // 子步循环：倾向 → 边界倾向改写 → RK 更新 → 边界场值重构
        loop {
            accumulate_tendencies(&mut fields);
            ib.apply_tendencies(&grid, &mut fields).unwrap();
            timeloop.exec(&grid, &mut fields);
            ib.apply_fields(&grid, &mut fields).unwrap();

            if !timeloop.in_substep() {
                break;
            }
        }

        timeloop.step_time();
        ib.log_summary(timeloop.in_substep());

        if timeloop.do_check() {
            let _elapsed = timeloop.check();
        }
        if timeloop.do_save(&coord) {
            timeloop.save(&coord, dir.path(), timeloop.iotime()).unwrap();
            saves += 1;
        }
    }

    // 时间簿记：4 个整步
    assert_eq!(timeloop.iteration(), 4);
    assert_eq!(timeloop.itime(), 4_000_000_000);
    assert!((timeloop.time() - 4.0).abs() < 1e-12);

    // savetime=2: 在 t=2 与 t=4 各保存一次
    assert_eq!(saves, 2);
    assert!(dir.path().join("time.0000002").exists());
    assert!(dir.path().join("time.0000004").exists());

    // 场值保持有限，幽灵单元被拉向边界值
    let th = fields.get("th").unwrap();
    assert!(th.data.iter().all(|v| v.is_finite()));
    for cell in ib.catalog(StaggerLocation::Center).cells() {
        let value = th.data[grid.index(cell.i, cell.j, cell.k)];
        let above = th.data[grid.index(cell.i, cell.j, cell.k + 1)];
        assert!(value <= above + 1e-9, "ghost not pulled toward boundary");
    }
}

#[test]
fn restart_reproduces_time_state() {
    let dir = tempfile::tempdir().unwrap();
    let grid = terrain_grid();
    let coord = SingleProcess::new();
    let mut fields = prognostic_fields(&grid);

    // 第一段：推进两步后保存
    let mut first = Timeloop::new(&time_config(), RunMode::Run).unwrap();
    for _ in 0..2 {
        first.set_time_step_limit(&coord);
        first.set_time_step().unwrap();
        loop {
            accumulate_tendencies(&mut fields);
            first.exec(&grid, &mut fields);
            if !first.in_substep() {
                break;
            }
        }
        first.step_time();
    }
    first.save(&coord, dir.path(), first.iotime()).unwrap();

    // 第二段：从检查点恢复
    let mut config = time_config();
    config.starttime = Some(2.0);
    let mut second = Timeloop::new(&config, RunMode::Run).unwrap();
    second.load(&coord, dir.path(), 2).unwrap();

    assert_eq!(second.itime(), first.itime());
    assert_eq!(second.idt(), first.idt());
    assert_eq!(second.iteration(), first.iteration());
    assert!((second.time() - first.time()).abs() < 1e-15);

    // 恢复后的第一个迭代不做统计（重启防护）
    assert!(!second.is_stats_step());

    // 继续推进：两条时间线逐位一致
    let mut fields2 = prognostic_fields(&grid);
    for timeloop in [&mut first, &mut second] {
        timeloop.set_time_step_limit(&coord);
        timeloop.set_time_step().unwrap();
    }
    loop {
        accumulate_tendencies(&mut fields);
        first.exec(&grid, &mut fields);
        if !first.in_substep() {
            break;
        }
    }
    loop {
        accumulate_tendencies(&mut fields2);
        second.exec(&grid, &mut fields2);
        if !second.in_substep() {
            break;
        }
    }
    first.step_time();
    second.step_time();

    assert_eq!(first.itime(), second.itime());
    assert_eq!(first.iteration(), second.iteration());
}

#[test]
fn gaussian_hill_catalogs_respect_dimensionality() {
    let grid = terrain_grid();

    let mut config = ImmersedBoundaryConfig {
        boundary_type: BoundaryType::Gaussian,
        amplitude: 200.0,
        z_offset: 50.0,
        x0_hill: 800.0,
        sigma_x_hill: 200.0,
        n_neighbours: 8,
        ..Default::default()
    };

    let ib_1d = ImmersedBoundary::from_config(&config, &grid).unwrap();
    let count_1d = ib_1d.catalog(StaggerLocation::Center).len();
    assert!(count_1d > 0);

    // 二维山丘只覆盖部分 y 范围，幽灵单元不应多于一维情形
    config.xy_dims = 2;
    config.y0_hill = 200.0;
    config.sigma_y_hill = 100.0;
    let ib_2d = ImmersedBoundary::from_config(&config, &grid).unwrap();
    let count_2d = ib_2d.catalog(StaggerLocation::Center).len();
    assert!(count_2d > 0);
    assert!(count_2d <= count_1d * 2);
}
