//! Compare BVH queries against a linear scan over the same scene.
//!
//! Run with: cargo run --release --example bvh_vs_linear -- [sphere-count] [config.json]

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use lumen_geometry::{BvhConfig, BvhTree, Hittable, HittableList, Interval, MaterialId, Ray, Sphere, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

const SCENE_SEED: u64 = 0x5eed;
const RAY_COUNT: usize = 200_000;

fn random_spheres(count: usize) -> Result<Vec<Box<dyn Hittable>>> {
    let mut rng = StdRng::seed_from_u64(SCENE_SEED);
    (0..count)
        .map(|i| {
            let center = Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            );
            let sphere = Sphere::new(center, rng.gen_range(0.2..1.5), MaterialId(i as u32))?;
            Ok(Box::new(sphere) as Box<dyn Hittable>)
        })
        .collect()
}

fn random_rays(count: usize) -> Vec<Ray> {
    let mut rng = StdRng::seed_from_u64(SCENE_SEED + 1);
    (0..count)
        .map(|_| {
            let origin = Vec3::new(rng.gen_range(-80.0..80.0), rng.gen_range(-80.0..80.0), 100.0);
            let target = Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), 0.0);
            Ray::new_simple(origin, target - origin)
        })
        .collect()
}

fn load_config(path: Option<&String>) -> Result<BvhConfig> {
    let Some(path) = path else {
        return Ok(BvhConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse BVH config in {path}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let count: usize = match args.get(1) {
        Some(arg) => arg.parse().with_context(|| format!("Invalid sphere count: {arg}"))?,
        None => 2_000,
    };
    let config = load_config(args.get(2))?;

    let start = Instant::now();
    let bvh = BvhTree::with_config(random_spheres(count)?, config)?;
    log::info!(
        "Built BVH over {} spheres in {:?}: {} nodes, depth {}",
        bvh.len(),
        start.elapsed(),
        bvh.nodes().len(),
        bvh.depth()
    );
    let list = HittableList::from(random_spheres(count)?);
    let rays = random_rays(RAY_COUNT);
    let ray_t = Interval::new(0.001, f32::INFINITY);

    let start = Instant::now();
    let linear: Vec<Option<f32>> = rays
        .par_iter()
        .map(|ray| list.closest_hit(ray, ray_t).map(|rec| rec.t))
        .collect();
    let linear_time = start.elapsed();

    let start = Instant::now();
    let accelerated: Vec<Option<f32>> = rays
        .par_iter()
        .map(|ray| bvh.closest_hit(ray, ray_t).map(|rec| rec.t))
        .collect();
    let bvh_time = start.elapsed();

    let mismatches = linear
        .iter()
        .zip(&accelerated)
        .filter(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => (a - b).abs() > 1e-4,
            (None, None) => false,
            _ => true,
        })
        .count();
    let hits = accelerated.iter().filter(|t| t.is_some()).count();

    println!("Rays:        {RAY_COUNT} ({hits} hits)");
    println!("Linear scan: {linear_time:?}");
    println!("BVH:         {bvh_time:?}");
    println!(
        "Speedup:     {:.1}x",
        linear_time.as_secs_f64() / bvh_time.as_secs_f64().max(f64::EPSILON)
    );

    if mismatches > 0 {
        anyhow::bail!("{mismatches} rays disagree between BVH and linear scan");
    }
    println!("All results match");

    Ok(())
}
