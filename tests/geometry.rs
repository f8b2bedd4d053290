mod common;

use common::synthetic_scene::{pitched_camera, random_costs, room_geometry, tiny_costs};
use manhattan_layout::homography::unproject;
use manhattan_layout::image::labels::HORIZONTAL_SURFACE;
use manhattan_layout::{
    solve_batch, GroundTruth, LayoutError, LayoutFrame, LayoutParams, ManhattanReconstructor,
    ScaledGeometry,
};
use nalgebra::{Vector2, Vector3};

#[test]
fn grid_and_image_round_trip_under_pitch() {
    let geometry = ScaledGeometry::new(pitched_camera(), -1.2, 1.4, (64, 48)).unwrap();
    for &(x, y) in &[(0.0, 0.0), (10.5, 40.0), (63.0, 47.0), (31.0, 2.0)] {
        let grid = Vector2::new(x, y);
        let back = geometry.image_to_grid(&geometry.grid_to_image(&grid));
        assert!((back - grid).norm() < 1e-9, "({x}, {y}) -> {back:?}");
    }
    let rows = 48;
    assert!(geometry.horizon_row() > 0 && geometry.horizon_row() < rows);
}

#[test]
fn transfer_moves_floor_points_to_the_ceiling_above() {
    let geometry = ScaledGeometry::new(pitched_camera(), -1.2, 1.4, (64, 48)).unwrap();
    let camera = geometry.camera();
    let floor = camera.project(&Vector3::new(0.5, 2.5, -1.2)).unwrap();
    let ceil = camera.project(&Vector3::new(0.5, 2.5, 1.4)).unwrap();
    let floor_grid = geometry.image_to_grid(&unproject(&floor));
    let ceil_grid = geometry.image_to_grid(&unproject(&ceil));

    assert!(floor_grid.y > geometry.horizon_row() as f64);
    assert!(ceil_grid.y < geometry.horizon_row() as f64);
    assert!((geometry.transfer(&floor_grid) - ceil_grid).norm() < 1e-6);
    assert!((geometry.transfer(&ceil_grid) - floor_grid).norm() < 1e-6);
    // World verticals are grid columns.
    assert!((floor_grid.x - ceil_grid.x).abs() < 1e-6);
}

#[test]
fn back_projection_lands_on_floor_and_ceiling() {
    let geometry = ScaledGeometry::new(pitched_camera(), -1.2, 1.4, (64, 48)).unwrap();
    let camera = geometry.camera();
    for world in [Vector3::new(-0.4, 3.0, -1.2), Vector3::new(0.8, 2.0, 1.4)] {
        let image = camera.project(&world).unwrap();
        let lifted = geometry.back_project(&unproject(&image)).unwrap();
        assert!((lifted - world).norm() < 1e-6, "{world:?} -> {lifted:?}");
    }
}

#[test]
fn wall_extent_spans_ceiling_to_floor() {
    // Level camera: ceiling row 0 sits 14 rows above the horizon, so the
    // floor below it is at 14 + 14 / 1.2 rows.
    let geometry = room_geometry();
    let (top, bottom) = geometry.wall_extent_unclamped(&Vector2::new(5.0, 0.0));
    assert!(top.abs() < 1e-9);
    assert!((bottom - (14.0 + 14.0 / 1.2)).abs() < 1e-6, "bottom={bottom}");
    assert_eq!(geometry.wall_extent(&Vector2::new(5.0, 0.0)), (0, 25));

    // A wall standing on the bottom row reaches above the grid.
    let (top, bottom) = geometry.wall_extent_unclamped(&Vector2::new(5.0, 29.0));
    assert!((top + 4.0).abs() < 1e-6, "top={top}");
    assert!((bottom - 29.0).abs() < 1e-9);
    assert_eq!(geometry.wall_extent(&Vector2::new(5.0, 29.0)), (0, 29));
}

#[test]
fn equal_heights_are_rejected() {
    let err = ScaledGeometry::new(pitched_camera(), 1.0, 1.0, (64, 48)).unwrap_err();
    assert!(matches!(err, LayoutError::Configuration { .. }));
}

#[test]
fn reconstructor_requires_a_solve_first() {
    let reconstructor = ManhattanReconstructor::new(LayoutParams::default());
    assert_eq!(reconstructor.solution().err(), Some(LayoutError::NotSolved));
    assert!(reconstructor.depth_map().is_err());
    assert!(reconstructor.report().is_err());
}

#[test]
fn reconstructor_renders_a_finite_depth_map() {
    let geometry = room_geometry();
    let (w, h) = geometry.grid_size();
    let costs = random_costs(w, h, 4);
    let mut reconstructor = ManhattanReconstructor::new(LayoutParams::default());
    reconstructor.compute(geometry, &costs).unwrap();

    let depth = reconstructor.depth_map().unwrap();
    assert_eq!(depth.size(), (40, 30));
    assert!(depth.data.iter().all(|d| d.is_finite() && *d > 0.0));

    let orients = reconstructor.exact_orients().unwrap();
    assert_eq!(orients.size(), (40, 30));
    assert!(orients.count(HORIZONTAL_SURFACE) > 0);
    assert!(orients.count(HORIZONTAL_SURFACE) < 40 * 30);

    let report = reconstructor.report().unwrap();
    assert_eq!(report.grid.horizon_row, 14);
    assert_eq!(report.path_rows.len(), 40);
    assert!(reconstructor.timings().stage_ms("solve").is_some());
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("numWalls").is_some());
    assert!(json.get("labellingError").is_none());
}

#[test]
fn solution_has_zero_error_against_itself() {
    let geometry = room_geometry();
    let (zfloor, zceil) = (geometry.zfloor(), geometry.zceil());
    let costs = random_costs(40, 30, 8);
    let mut reconstructor = ManhattanReconstructor::new(LayoutParams::default());
    reconstructor.compute(geometry, &costs).unwrap();

    let truth = GroundTruth {
        orientations: reconstructor.solution().unwrap().pixel_orients.clone(),
        depth: reconstructor.depth_map().unwrap(),
        zfloor,
        zceil,
    };
    let (labels, depth) = reconstructor.report_errors(&truth).unwrap();
    assert_eq!(labels, 0.0);
    assert!(depth < 1e-6, "depth error {depth}");

    let report = reconstructor.evaluated_report(&truth).unwrap();
    assert_eq!(report.labelling_error, Some(0.0));
}

#[test]
fn batch_solves_each_frame_independently() {
    let camera = room_geometry().camera().clone();
    let mut params = LayoutParams::default();
    params.geometry.grid_size = [40, 30];
    let frames = vec![
        LayoutFrame {
            camera: camera.clone(),
            zfloor: -1.0,
            zceil: 1.2,
            costs: random_costs(40, 30, 1),
        },
        LayoutFrame {
            camera: camera.clone(),
            zfloor: -1.0,
            zceil: 1.2,
            // Wrong grid size: fails on its own.
            costs: tiny_costs(),
        },
        LayoutFrame {
            camera,
            zfloor: -1.0,
            zceil: 1.2,
            costs: random_costs(40, 30, 1),
        },
    ];
    let reports = solve_batch(&frames, &params);
    assert_eq!(reports.len(), 3);
    assert!(reports[1].is_err());
    let (a, c) = (reports[0].as_ref().unwrap(), reports[2].as_ref().unwrap());
    assert_eq!(a.score, c.score);
    assert_eq!(a.path_rows, c.path_rows);
}
