/// Session configuration for the center-point tracker
///
/// A configuration is fixed when the tracker is constructed; there is no
/// reloading mid-session.
use crate::assignment::AssignmentStrategy;
use crate::classes::{ClassGate, ClassTable};
use crate::error::{Result, TrackerError};
use crate::motion::MotionModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Noise parameters of the constant-acceleration Kalman filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterNoise {
    /// Initial state covariance (diagonal, all six state components)
    pub initial_covariance: f32,
    /// Process noise covariance diagonal
    pub process_noise: f32,
    /// Observation noise covariance diagonal
    pub measurement_noise: f32,
}

impl Default for FilterNoise {
    fn default() -> Self {
        Self {
            initial_covariance: 10.0,
            process_noise: 1.0,
            measurement_noise: 1.0,
        }
    }
}

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Detection-to-track assignment strategy
    pub strategy: AssignmentStrategy,
    /// Motion model used for every track of the session
    pub motion_model: MotionModel,
    /// Unmatched tracks are dropped once their age reaches this value
    pub max_age: u32,
    /// Score subtracted from unmatched tracks every frame; `None` disables decay
    pub score_decay: Option<f32>,
    /// Unmatched tracks above this score keep counting as active
    pub activation_threshold: f32,
    /// Newly born tracks above this score start active
    pub detection_threshold: f32,
    /// Unmatched tracks at or below this score are dropped
    pub deletion_threshold: f32,
    /// Activity assigned to tracks born while no other track is alive
    pub min_hits: u32,
    /// Feed detection velocities into the filter update
    pub use_velocity: bool,
    /// Built-in class table: "nuscenes" or "waymo"
    pub dataset: String,
    /// Explicit class table, overrides `dataset` when present
    pub classes: Option<Vec<ClassGate>>,
    /// Kalman filter noise (filter motion model only)
    pub filter: FilterNoise,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::Greedy,
            motion_model: MotionModel::Point,
            max_age: 6,
            score_decay: None,
            activation_threshold: 1.0,
            detection_threshold: 0.0,
            deletion_threshold: 0.0,
            min_hits: 1,
            use_velocity: false,
            dataset: "nuscenes".to_string(),
            classes: None,
            filter: FilterNoise::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Resolve the class table, preferring an explicit one over the dataset preset
    pub fn class_table(&self) -> Result<ClassTable> {
        match &self.classes {
            Some(classes) => ClassTable::new(classes.clone()),
            None => ClassTable::for_dataset(&self.dataset),
        }
    }

    /// Check every parameter; called by the tracker constructor
    pub fn validate(&self) -> Result<()> {
        if self.max_age == 0 {
            return Err(TrackerError::config("max_age must be at least 1"));
        }

        let thresholds = [
            ("activation_threshold", self.activation_threshold),
            ("detection_threshold", self.detection_threshold),
            ("deletion_threshold", self.deletion_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(TrackerError::config(format!("{name} must be finite, got {value}")));
            }
        }

        if let Some(decay) = self.score_decay {
            if !decay.is_finite() || decay < 0.0 {
                return Err(TrackerError::config(format!(
                    "score_decay must be a non-negative number, got {decay}"
                )));
            }
        }

        if self.motion_model == MotionModel::Filter {
            let noise = [
                ("initial_covariance", self.filter.initial_covariance),
                ("process_noise", self.filter.process_noise),
                ("measurement_noise", self.filter.measurement_noise),
            ];
            for (name, value) in noise {
                if !value.is_finite() || value <= 0.0 {
                    return Err(TrackerError::config(format!(
                        "filter.{name} must be positive, got {value}"
                    )));
                }
            }
        }

        self.class_table().map(|_| ())
    }
}
