//! smallsite — smallest end-to-end demo of the estate layout engine.
//!
//! Lays out a synthetic 100×100 m industrial site in grid mode, prints the
//! summary metrics, and writes the full layout record to
//! `smallsite_layout.json`.  Swap SITE for a surveyed boundary polygon (in
//! metres) to run on real ground.

use std::fs;
use std::time::Instant;

use anyhow::Result;

use estate_core::{LayoutConfig, LayoutMethod, LayoutStatus, Pt};
use estate_pipeline::{BlockClass, PipelineBuilder};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 42;
const OUTPUT_PATH: &str = "smallsite_layout.json";

/// 100×100 m square site, metric site-local coordinates.
const SITE: [(f64, f64); 4] = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];

fn main() -> Result<()> {
    env_logger::init();

    let config = LayoutConfig {
        layout_method: LayoutMethod::Grid,
        spacing_min: 19.0,
        spacing_max: 21.5,
        angle_min: 0.0,
        angle_max: 5.0,
        population_size: 50,
        generations: 20,
        target_lot_width: 6.0,
        min_lot_width: 4.0,
        max_lot_width: 8.0,
        min_lot_area: 30.0,
        setback_distance: 6.0,
        road_main_width: 8.0,
        road_internal_width: 2.0,
        seed: SEED,
        ..Default::default()
    };

    let site: Vec<Pt> = SITE.iter().map(|&(x, y)| Pt::new(x, y)).collect();
    let pipeline = PipelineBuilder::new(config).build()?;

    let started = Instant::now();
    let layout = pipeline.run(&site, &[]);
    let elapsed = started.elapsed();

    // ── Summary ───────────────────────────────────────────────────────────
    println!("status: {:?}  ({elapsed:.2?})", layout.status);
    if layout.status == LayoutStatus::Failed {
        anyhow::bail!("layout failed: {:?}", layout.fatal);
    }
    let commercial = layout
        .blocks
        .iter()
        .filter(|b| b.class == BlockClass::Commercial)
        .count();
    println!(
        "blocks: {} ({} commercial)  lots: {}  roads: {:.0} m",
        layout.blocks.len(),
        commercial,
        layout.lots.len(),
        layout.road_length_m(),
    );
    println!(
        "utilization: {:.1} %  avg lot: {:.0} m²  mst: {:.0} m  transformers: {}",
        layout.metrics.utilization_ratio * 100.0,
        layout.metrics.average_lot_area,
        layout.metrics.mst_length_m,
        layout.transformers.len(),
    );
    for warning in &layout.warnings {
        println!("warning: {warning}");
    }

    fs::write(OUTPUT_PATH, serde_json::to_string_pretty(&layout)?)?;
    println!("layout written to {OUTPUT_PATH}");
    Ok(())
}
