//! Tracked-class tables and per-class association gates
//!
//! Each dataset tracks a fixed list of classes. Every class carries a
//! velocity-error gate: the largest displacement (in meters) a detection of
//! that class may have from a track's predicted position and still be
//! associated with it.

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};

/// One tracked class and its association gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGate {
    /// Class name as emitted by the detector
    pub name: String,
    /// Maximum plausible displacement between frames, in meters
    pub max_distance: f32,
}

impl ClassGate {
    pub fn new<S: Into<String>>(name: S, max_distance: f32) -> Self {
        Self {
            name: name.into(),
            max_distance,
        }
    }
}

/// Ordered table of tracked classes
///
/// The position of a class in the table is its class index; detections and
/// tracks are compared by index during association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTable {
    classes: Vec<ClassGate>,
}

impl ClassTable {
    /// Build a table from explicit gates, rejecting empty tables, duplicate
    /// names and gates that are not positive finite distances.
    pub fn new(classes: Vec<ClassGate>) -> Result<Self> {
        if classes.is_empty() {
            return Err(TrackerError::config("class table has no tracked classes"));
        }
        for (i, gate) in classes.iter().enumerate() {
            if !gate.max_distance.is_finite() || gate.max_distance <= 0.0 {
                return Err(TrackerError::config(format!(
                    "class '{}' has invalid gate {}",
                    gate.name, gate.max_distance
                )));
            }
            if classes[..i].iter().any(|other| other.name == gate.name) {
                return Err(TrackerError::config(format!(
                    "class '{}' listed more than once",
                    gate.name
                )));
            }
        }
        Ok(Self { classes })
    }

    /// nuScenes detection classes.
    ///
    /// Gates are the 99.9th percentile of the per-class l2 velocity error
    /// over half a second.
    pub fn nuscenes() -> Self {
        Self {
            classes: vec![
                ClassGate::new("bicycle", 2.5),
                ClassGate::new("bus", 5.5),
                ClassGate::new("car", 3.0),
                ClassGate::new("motorcycle", 4.0),
                ClassGate::new("pedestrian", 1.0),
                ClassGate::new("trailer", 2.0),
                ClassGate::new("truck", 4.0),
                ClassGate::new("construction_vehicle", 1.0),
                ClassGate::new("barrier", 1.0),
                ClassGate::new("traffic_cone", 1.0),
            ],
        }
    }

    /// Waymo Open Dataset classes (label ids 1, 2 and 4).
    pub fn waymo() -> Self {
        Self {
            classes: vec![
                ClassGate::new("vehicle", 2.0),
                ClassGate::new("pedestrian", 0.2),
                ClassGate::new("cyclist", 0.5),
            ],
        }
    }

    /// Look up a built-in table by dataset name (case-insensitive)
    pub fn for_dataset(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "nuscenes" => Ok(Self::nuscenes()),
            "waymo" => Ok(Self::waymo()),
            _ => Err(TrackerError::UnknownDataset(name.to_string())),
        }
    }

    /// Class index of `name`, or `None` when the class is not tracked
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }

    /// Association gate of a class, `None` for an index outside the table
    pub fn gate(&self, class_idx: usize) -> Option<f32> {
        self.classes.get(class_idx).map(|class| class.max_distance)
    }

    pub fn name(&self, class_idx: usize) -> Option<&str> {
        self.classes.get(class_idx).map(|class| class.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassGate> {
        self.classes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nuscenes_table() {
        let table = ClassTable::nuscenes();
        assert_eq!(table.len(), 10);
        let car = table.index_of("car").unwrap();
        assert_eq!(table.gate(car), Some(3.0));
        assert_eq!(table.name(car), Some("car"));
        assert_eq!(table.gate(table.index_of("bus").unwrap()), Some(5.5));
        assert_eq!(table.gate(10), None);
        assert_eq!(table.name(10), None);
        assert!(table.index_of("airplane").is_none());
        assert!(table.iter().any(|class| class.name == "traffic_cone"));
    }

    #[test]
    fn test_dataset_lookup() {
        assert_eq!(ClassTable::for_dataset("Nuscenes").unwrap(), ClassTable::nuscenes());
        assert_eq!(ClassTable::for_dataset("WAYMO").unwrap(), ClassTable::waymo());
        assert!(matches!(
            ClassTable::for_dataset("kitti"),
            Err(TrackerError::UnknownDataset(name)) if name == "kitti"
        ));
    }

    #[test]
    fn test_custom_table_validation() {
        assert!(ClassTable::new(vec![]).is_err());
        assert!(ClassTable::new(vec![ClassGate::new("car", 0.0)]).is_err());
        assert!(ClassTable::new(vec![ClassGate::new("car", f32::NAN)]).is_err());
        assert!(ClassTable::new(vec![ClassGate::new("car", 3.0), ClassGate::new("car", 2.0)]).is_err());

        let table = ClassTable::new(vec![ClassGate::new("car", 3.0)]).unwrap();
        assert_eq!(table.index_of("car"), Some(0));
    }
}
