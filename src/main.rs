use clap::Parser;
use colored::*;
use std::time::Duration;

mod args;

use args::Args;
use foodvol::artifacts::ArtifactStore;
use foodvol::models;
use foodvol::{EstimateRequest, EstimatorConfig, OnnxDepthModel, OnnxHandDetector, VolumePipeline};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // 0. Load config
    let config = EstimatorConfig::load_from(&args.config)?;

    // 1. Load the capability providers (cold start, once per process)
    let hand_path = models::resolve_model(&config.models.hand_model, &config.models.hand_model_repo)?;
    let depth_path =
        models::resolve_model(&config.models.depth_model, &config.models.depth_model_repo)?;

    println!("Loading hand landmark model from {}...", hand_path.display());
    let hand_detector = OnnxHandDetector::new(hand_path.to_str().unwrap_or_default())?;

    println!("Loading depth model from {}...", depth_path.display());
    let depth_model = OnnxDepthModel::new(
        depth_path.to_str().unwrap_or_default(),
        Duration::from_millis(config.models.depth_timeout_ms),
    )?;

    let mut pipeline = VolumePipeline::new(Box::new(hand_detector), Box::new(depth_model), config);

    // 2. Run the estimate
    let image_bytes = std::fs::read(&args.image)?;
    let key = args.key.clone().unwrap_or_else(ArtifactStore::timestamp_key);

    let request = EstimateRequest {
        hand_length_cm: args.hand_length_cm,
        bowl_factor: args.bowl_factor,
        dish_type: args.dish_type.clone(),
        artifact_key: Some(key.clone()),
    };

    let estimate = match pipeline.estimate(&image_bytes, &request) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", format!("Estimation failed: {}", e).red());
            std::process::exit(1);
        }
    };

    if args.annotate {
        let frame = image::load_from_memory(&image_bytes)?.to_rgb8();
        pipeline.annotate(&frame, &key)?;
    }

    // 3. Report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!("{}", "Estimate complete".green());
    println!("{:<22} {:>10.2} cm2", "Corrected area", estimate.area_cm2);
    println!("{:<22} {:>10.2} cm", "Thickness", estimate.thickness_cm);
    println!("{:<22} {:>10.2} cm3", "Volume", estimate.volume_cm3);
    println!("{:<22} {:>10.3}", "Depth ratio", estimate.depth_ratio);
    println!("{:<22} {:>10.3}", "Perspective factor", estimate.perspective_factor);
    println!("{:<22} {:>10.4} cm/px", "Scale", estimate.scale_cm_per_px);
    println!("{:<22} {:>10.2} px", "Palm length", estimate.hand_pixel_length);
    println!("{:<22} {:>10}", "Dish type", estimate.dish_type);

    Ok(())
}
