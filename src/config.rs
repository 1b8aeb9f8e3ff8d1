use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which landmark subset the hand hull is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HullMode {
    /// Hull over all 21 keypoints. What the volume service wants.
    #[default]
    All,
    /// Wrist + four finger-base knuckles. Tighter palm hull, useful when
    /// occluding the hand for an external recognizer.
    Knuckles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub models: ModelsConfig,
    pub artifacts: ArtifactsConfig,
    pub heuristics: Heuristics,
    pub hull_mode: HullMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub hand_model: String,
    pub depth_model: String,
    /// Hub repos to fetch from when the local files are missing.
    pub hand_model_repo: String,
    pub depth_model_repo: String,
    /// Budget for one depth inference. Exceeding it fails the request.
    pub depth_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: String,
    pub save: bool,
}

/// Empirical tuning constants. These are not derived from camera geometry;
/// they are exposed here so they can be adjusted without touching the
/// algorithm's control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Upper bound of the min-max depth normalization range.
    pub depth_scale: f32,
    /// Super-linear penalty applied to the depth ratio when the food sits
    /// nearer the camera than the hand. Must stay 1.5 for behavioral parity
    /// with the tuned service.
    pub perspective_exponent: f32,
    /// cos(45 degrees), approximating an oblique viewing angle. Fixed, not
    /// recomputed from actual camera tilt.
    pub oblique_cos: f32,
    /// Fraction of the bounding prism a hemispherical bowl profile fills.
    pub bowl_profile: f32,
    /// Lower bound on estimated thickness (cm).
    pub thickness_floor_cm: f32,
    /// Thickness assumed when the food mask is empty (cm).
    pub empty_mask_thickness_cm: f32,
    /// Seed rectangle inset, as a fraction of each image dimension.
    pub seed_inset: f32,
    /// Fixed number of segmentation refinement rounds.
    pub refine_iterations: u32,
    /// Color clusters per foreground/background model.
    pub color_clusters: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            hand_model: "models/hand_landmarks.onnx".to_string(),
            depth_model: "models/depth_midas_small.onnx".to_string(),
            hand_model_repo: "qualcomm/MediaPipe-Hand-Detection".to_string(),
            depth_model_repo: "julienkay/sentis-MiDaS".to_string(),
            depth_timeout_ms: 30_000,
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "food_masks".to_string(),
            save: true,
        }
    }
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            depth_scale: 20.0,
            perspective_exponent: 1.5,
            oblique_cos: std::f32::consts::FRAC_1_SQRT_2,
            bowl_profile: 2.0 / 3.0,
            thickness_floor_cm: 0.1,
            empty_mask_thickness_cm: 1.0,
            seed_inset: 0.1,
            refine_iterations: 5,
            color_clusters: 5,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            artifacts: ArtifactsConfig::default(),
            heuristics: Heuristics::default(),
            hull_mode: HullMode::default(),
        }
    }
}

impl EstimatorConfig {
    pub const PATH: &'static str = "config.json";

    pub fn load() -> Result<Self> {
        Self::load_from(Self::PATH)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            // #[serde(default)] fills any fields missing from older files
            match serde_json::from_str::<EstimatorConfig>(&content) {
                Ok(c) => {
                    tracing::info!("loaded configuration from {}", path);
                    c
                }
                Err(e) => {
                    tracing::warn!("error parsing config: {}. loading defaults", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("configuration file not found, creating default at {}", path);
            Self::default()
        };

        // Save back so new fields show up in the file
        config.save_to(path)?;

        Ok(config)
    }

    pub fn save_to(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
