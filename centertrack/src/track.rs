//! Live tracks and the records emitted for them

use crate::detection::Observation;
use crate::motion::{Kinematics, MotionState};
use serde::{Deserialize, Serialize};

/// A track owned by the tracker
#[derive(Debug, Clone)]
pub struct Track {
    /// Session-unique identity, starting at 1
    pub id: u32,
    /// Center; components past the first two come from the last detection
    pub translation: Vec<f32>,
    pub velocity: Option<[f32; 2]>,
    /// Class name, fixed at birth
    pub class_name: String,
    /// Index into the session class table, fixed at birth
    pub class_idx: usize,
    pub score: f32,
    /// Frames since the last match (1 when matched this frame)
    pub age: u32,
    /// Activity counter
    pub active: u32,
    pub size: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub sample_token: Option<String>,
    pub(crate) motion: MotionState,
}

impl Track {
    pub(crate) fn born(id: u32, obs: &Observation<'_>, motion: MotionState, active: u32) -> Self {
        let det = obs.detection;
        Self {
            id,
            translation: det.translation.clone(),
            velocity: obs.velocity,
            class_name: det.class_name.clone(),
            class_idx: obs.class_idx,
            score: det.score,
            age: 1,
            active,
            size: det.size,
            rotation: det.rotation,
            sample_token: det.sample_token.clone(),
            motion,
        }
    }

    /// Refresh a matched track from its detection, keeping identity and class
    pub(crate) fn absorb(&mut self, obs: &Observation<'_>, kinematics: Kinematics) {
        let det = obs.detection;
        self.translation.clone_from(&det.translation);
        self.score = det.score;
        self.size = det.size;
        self.rotation = det.rotation;
        self.sample_token.clone_from(&det.sample_token);
        self.age = 1;
        self.active += 1;
        self.set_kinematics(kinematics);
    }

    pub(crate) fn set_kinematics(&mut self, kinematics: Kinematics) {
        self.translation[0] = kinematics.position[0];
        self.translation[1] = kinematics.position[1];
        self.velocity = kinematics.velocity;
    }

    /// Planar center
    pub fn position(&self) -> [f32; 2] {
        [self.translation[0], self.translation[1]]
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn record(&self) -> TrackRecord {
        TrackRecord {
            id: self.id,
            translation: self.translation.clone(),
            velocity: self.velocity,
            class_name: self.class_name.clone(),
            score: self.score,
            age: self.age,
            active: self.active,
            size: self.size,
            rotation: self.rotation,
            sample_token: self.sample_token.clone(),
        }
    }
}

/// Snapshot of a track returned from each frame
///
/// Field names follow the nuScenes tracking submission format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(rename = "tracking_id")]
    pub id: u32,
    pub translation: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f32; 2]>,
    #[serde(rename = "tracking_name")]
    pub class_name: String,
    #[serde(rename = "tracking_score")]
    pub score: f32,
    pub age: u32,
    pub active: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_token: Option<String>,
}

impl TrackRecord {
    /// Whether the track currently counts as active
    pub fn is_active(&self) -> bool {
        self.active > 0
    }

    /// Planar center, `None` when fewer than two components are present
    pub fn position(&self) -> Option<[f32; 2]> {
        match self.translation.as_slice() {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;

    fn observation(det: &Detection) -> Observation<'_> {
        Observation {
            detection: det,
            center: det.center().unwrap(),
            velocity: det.planar_velocity(),
            class_idx: 2,
        }
    }

    #[test]
    fn test_born_track() {
        let mut det = Detection::new(1.0, 2.0, "car", 0.7).with_velocity(0.5, 0.0);
        det.translation.push(0.8);
        let track = Track::born(4, &observation(&det), MotionState::Offset([0.0, 0.0]), 1);

        assert_eq!(track.id, 4);
        assert_eq!(track.age, 1);
        assert_eq!(track.active, 1);
        assert_eq!(track.position(), [1.0, 2.0]);
        assert_eq!(track.translation[2], 0.8);
        assert_eq!(track.velocity, Some([0.5, 0.0]));
    }

    #[test]
    fn test_absorb_keeps_identity() {
        let first = Detection::new(0.0, 0.0, "car", 0.9);
        let mut track = Track::born(1, &observation(&first), MotionState::Offset([0.0, 0.0]), 1);
        track.age = 3;

        let second = Detection::new(1.0, 0.0, "car", 0.6);
        track.absorb(
            &observation(&second),
            Kinematics {
                position: [0.9, 0.1],
                velocity: Some([1.0, 0.0]),
            },
        );

        assert_eq!(track.id, 1);
        assert_eq!(track.age, 1);
        assert_eq!(track.active, 2);
        assert_eq!(track.score, 0.6);
        assert_eq!(track.position(), [0.9, 0.1]);
    }

    #[test]
    fn test_record_serialization() {
        let det = Detection::new(3.0, 4.0, "bus", 0.5);
        let record = Track::born(9, &observation(&det), MotionState::Offset([0.0, 0.0]), 0).record();
        assert!(!record.is_active());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tracking_id"], 9);
        assert_eq!(json["tracking_name"], "bus");
        assert!(json.get("velocity").is_none());
        assert_eq!(record.position(), Some([3.0, 4.0]));
    }

    #[test]
    fn test_short_record_has_no_position() {
        let record: TrackRecord = serde_json::from_str(
            r#"{"tracking_id": 1, "translation": [2.0], "tracking_name": "car",
                "tracking_score": 0.5, "age": 1, "active": 1}"#,
        )
        .unwrap();
        assert_eq!(record.position(), None);
    }
}
