//! Benchmarks the per-cycle kinematics pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swerve_lib::drive_ctrl::{
    desaturate, inverse_kinematics, optimise, shape, ChassisVelocity, Params, ShaperState,
};

fn bench_params() -> Params {
    Params {
        track_width_m: 0.7112,
        wheelbase_m: 0.7112,
        max_speed_ms: 4.8,
        max_ang_speed_rads: std::f64::consts::TAU,
        direction_slew_rate_rads: 1.2,
        magnitude_slew_rate: 1.8,
        rotational_slew_rate: 2.0,
        stationary_direction_slew_rads: 500.0,
        reversal_mag_threshold: 1e-4,
        module_angular_offsets_rad: [
            -std::f64::consts::FRAC_PI_2,
            0.0,
            std::f64::consts::PI,
            std::f64::consts::FRAC_PI_2,
        ],
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let params = bench_params();
    let positions = params.module_positions();

    c.bench_function("shape", |b| {
        let state = ShaperState {
            dir_rad: 0.1,
            mag: 0.8,
            rot: 0.2,
        };
        b.iter(|| shape(black_box(state), 0.7, -0.4, 0.3, 0.02, &params))
    });

    c.bench_function("inverse_kinematics", |b| {
        let vel = ChassisVelocity {
            x_ms: 3.0,
            y_ms: -1.5,
            omega_rads: 2.0,
        };
        b.iter(|| inverse_kinematics(black_box(&vel), &positions))
    });

    c.bench_function("full_cycle", |b| {
        let state = ShaperState {
            dir_rad: 0.1,
            mag: 0.8,
            rot: 0.2,
        };
        b.iter(|| {
            let (_, demand) = shape(black_box(state), 0.7, -0.4, 0.3, 0.02, &params);
            let vel = ChassisVelocity {
                x_ms: demand.x_norm * params.max_speed_ms,
                y_ms: demand.y_norm * params.max_speed_ms,
                omega_rads: demand.omega_norm * params.max_ang_speed_rads,
            };
            let mut targets = inverse_kinematics(&vel, &positions);
            desaturate(&mut targets, params.max_speed_ms);
            for target in targets.iter_mut() {
                *target = optimise(*target, 0.0);
            }
            targets
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
