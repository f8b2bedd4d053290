use manhattan_layout::config::demo::{self, CostConfig};
use manhattan_layout::image::io::{
    load_grayscale_f32, save_depth_png, save_label_png, write_json_file,
};
use manhattan_layout::image::{ImageF32, ImageView, ImageViewMut};
use manhattan_layout::{CostField, ManhattanReconstructor, RectifiedGeometry, ScaledGeometry};
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = demo::load_config(Path::new(&config_path))?;

    let camera = config.camera.build()?;
    let geometry = ScaledGeometry::new(
        camera,
        config.zfloor,
        config.zceil,
        config.params.geometry.grid_size(),
    )
    .map_err(|e| format!("Failed to rectify: {e}"))?;
    let costs = load_costs(&config.costs, &geometry)?;

    let mut reconstructor = ManhattanReconstructor::new(config.params);
    let solution = reconstructor
        .compute(geometry, &costs)
        .map_err(|e| format!("Solve failed: {e}"))?;
    println!(
        "score={:.3} walls={} occlusions={}",
        solution.score, solution.num_walls, solution.num_occlusions
    );
    reconstructor.report_backtrack();

    let report = reconstructor.report().map_err(|e| e.to_string())?;
    write_json_file(&config.output.report_json, &report)?;

    if let Some(path) = &config.output.orients_png {
        let orients = &reconstructor.solution().map_err(|e| e.to_string())?.pixel_orients;
        save_label_png(orients, path)?;
    }
    if let Some(path) = &config.output.grid_orients_png {
        let grid = reconstructor.grid_orients().map_err(|e| e.to_string())?;
        save_label_png(&grid, path)?;
    }
    if let Some(path) = &config.output.depth_png {
        let depth = reconstructor.depth_map().map_err(|e| e.to_string())?;
        save_depth_png(&depth, path)?;
    }
    Ok(())
}

fn load_costs(cfg: &CostConfig, geometry: &RectifiedGeometry) -> Result<CostField, String> {
    let mut costs = CostField::new(
        geometry.grid_size(),
        cfg.wall_penalty,
        cfg.occlusion_penalty,
    );
    let importances = if cfg.image_space {
        Some(geometry.grid_importances().map_err(|e| e.to_string())?)
    } else {
        None
    };
    let to_grid = |path: &Path| -> Result<ImageF32, String> {
        let field = load_grayscale_f32(path)?;
        match &importances {
            Some(weights) => {
                let mut grid = geometry
                    .transform_data_to_grid(&field)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                for (v, &n) in grid.as_mut_slice().iter_mut().zip(weights.as_slice()) {
                    if n > 0.0 {
                        *v /= n;
                    }
                }
                Ok(grid)
            }
            None => Ok(field),
        }
    };
    for (axis, path) in [&cfg.axis0, &cfg.axis1].into_iter().enumerate() {
        costs
            .add_weighted(axis, &to_grid(path)?, cfg.weight)
            .map_err(|e| format!("{}: {e}", path.display()))?;
    }
    if let Some(path) = &cfg.shared {
        costs
            .add_weighted_shared(&to_grid(path)?, cfg.shared_weight)
            .map_err(|e| format!("{}: {e}", path.display()))?;
    }
    Ok(costs)
}

fn usage() -> String {
    "Usage: layout_demo <config.json>".to_string()
}
