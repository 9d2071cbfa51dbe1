//! Per-frame detector output consumed by the tracker

use serde::{Deserialize, Serialize};

/// A single detected object
///
/// Field names follow the nuScenes detection submission format so detector
/// output can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object center; the first two components are used for tracking and
    /// any further components are carried through untouched
    pub translation: Vec<f32>,
    /// Planar velocity estimate in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Vec<f32>>,
    #[serde(rename = "detection_name")]
    pub class_name: String,
    #[serde(rename = "detection_score")]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_token: Option<String>,
}

impl Detection {
    pub fn new<S: Into<String>>(x: f32, y: f32, class_name: S, score: f32) -> Self {
        Self {
            translation: vec![x, y],
            velocity: None,
            class_name: class_name.into(),
            score,
            size: None,
            rotation: None,
            sample_token: None,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity = Some(vec![vx, vy]);
        self
    }

    /// Planar center, `None` when fewer than two components are present
    pub fn center(&self) -> Option<[f32; 2]> {
        match self.translation.as_slice() {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        }
    }

    /// Planar velocity, `None` when absent or truncated
    pub fn planar_velocity(&self) -> Option<[f32; 2]> {
        match self.velocity.as_deref() {
            Some([vx, vy, ..]) => Some([*vx, *vy]),
            _ => None,
        }
    }

    /// Why this detection cannot be tracked, if anything is wrong with it
    pub(crate) fn malformed_reason(&self) -> Option<&'static str> {
        if self.translation.len() < 2 {
            return Some("translation has fewer than two components");
        }
        if self.translation.iter().any(|v| !v.is_finite()) {
            return Some("translation is not finite");
        }
        if let Some(velocity) = &self.velocity {
            if velocity.len() < 2 {
                return Some("velocity has fewer than two components");
            }
            if velocity.iter().any(|v| !v.is_finite()) {
                return Some("velocity is not finite");
            }
        }
        if !self.score.is_finite() {
            return Some("score is not finite");
        }
        None
    }
}

/// One frame of detections together with the time elapsed since the previous frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Seconds since the previous frame
    pub time_lag: f32,
    pub detections: Vec<Detection>,
}

/// A detection that passed class filtering and validation
#[derive(Debug, Clone)]
pub(crate) struct Observation<'a> {
    pub detection: &'a Detection,
    pub center: [f32; 2],
    pub velocity: Option<[f32; 2]>,
    pub class_idx: usize,
}
