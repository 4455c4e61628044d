//! # Planning Cycle Benchmark

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;

use comms_if::telem::Telemetry;
use nalgebra::Vector2;
use plan_lib::{
    behav::BehavParams,
    plan_mgr::{PlanMgr, PlanMgrParams},
    road_map::RoadMap,
    traj_gen::TrajGenParams,
};

fn plan_cycle_benchmark(c: &mut Criterion) {
    // ---- Build the road and the planner ----

    let params = PlanMgrParams {
        initial_lane: 1,
        initial_speed_target_ms: 15.0,
        ego_speed_scale: 1.0,
        behav: BehavParams {
            tick_s: 0.02,
            speed_limit_ms: 22.098,
            lane_width_m: 4.0,
            lane_count: 3,
            near_gap_m: 30.0,
            far_gap_m: 50.0,
            rear_gap_m: 10.0,
            lane_change_speed_deficit_ms: 2.232,
            maneuver_complete_band_m: [1.8, 2.2],
        },
        traj_gen: TrajGenParams {
            tick_s: 0.02,
            accel_ms2: 5.0,
            horizon_len: 50,
            keep_lane_spacing_m: 30.0,
            change_lane_spacing_m: 75.0,
            lane_width_m: 4.0,
        },
    };

    let road =
        Arc::new(RoadMap::generate_ring(Vector2::new(1000.0, 2000.0), 500.0, 120).unwrap());

    // ---- Telemetry mid-drive, with 45 points of the last path left and 12 vehicles ----

    let ego_s_m = 100.0;
    let ego_d_m = 6.0;
    let ego_pos = road.to_cartesian(ego_s_m, ego_d_m);

    let tail: Vec<Vector2<f64>> = (1..=45)
        .map(|i| road.to_cartesian(ego_s_m + i as f64 * 0.3, ego_d_m))
        .collect();

    let sensor_fusion = (0..12)
        .map(|i| {
            let s_m = ego_s_m - 60.0 + i as f64 * 15.0;
            let d_m = 2.0 + (i % 3) as f64 * 4.0;
            let pos = road.to_cartesian(s_m, d_m);
            let heading = road.heading_at(s_m);
            vec![
                i as f64,
                pos[0],
                pos[1],
                14.0 * heading.cos(),
                14.0 * heading.sin(),
                s_m,
                d_m,
            ]
        })
        .collect();

    let telem = Telemetry {
        x: ego_pos[0],
        y: ego_pos[1],
        s: ego_s_m,
        d: ego_d_m,
        yaw: road.heading_at(ego_s_m).to_degrees(),
        speed: 15.0,
        previous_path_x: tail.iter().map(|p| p[0]).collect(),
        previous_path_y: tail.iter().map(|p| p[1]).collect(),
        end_path_s: ego_s_m + 13.5,
        end_path_d: ego_d_m,
        sensor_fusion,
    };

    // Bench a full cycle, each on a fresh planner so the decision taken is always the same
    c.bench_function("PlanMgr::proc", |b| {
        b.iter_batched(
            || PlanMgr::new(params.clone(), road.clone()).unwrap(),
            |mut plan_mgr| plan_mgr.proc(&telem).unwrap(),
            BatchSize::SmallInput,
        )
    });

    // And the road conversions the cycle leans on
    c.bench_function("RoadMap::to_curvilinear", |b| {
        b.iter(|| road.to_curvilinear(&ego_pos, 0.0))
    });
}

criterion_group!(benches, plan_cycle_benchmark);
criterion_main!(benches);
