//! Center-point multi-object tracking library
//!
//! Tracks 3D object detections across frames by their planar centers. Each
//! frame's detections are associated with live tracks through a class-gated
//! distance matrix, solved greedily or optimally (Hungarian), and tracks are
//! propagated either by constant-velocity offsets or by a Kalman filter.
//!
//! # Usage
//!
//! ```rust,ignore
//! use centertrack::{AssignmentStrategy, CenterTracker, Detection, MotionModel, TrackerConfig};
//!
//! let config = TrackerConfig {
//!     strategy: AssignmentStrategy::Optimal,
//!     motion_model: MotionModel::Filter,
//!     ..Default::default()
//! };
//! let mut tracker = CenterTracker::new(config)?;
//!
//! let detections = vec![Detection::new(10.0, 4.0, "car", 0.9).with_velocity(5.0, 0.0)];
//! let tracks = tracker.process_frame(&detections, 0.5)?;
//! for track in &tracks {
//!     println!("{} {:?} age={}", track.id, track.translation, track.age);
//! }
//! ```

pub mod assignment; // Greedy and Hungarian assignment
pub mod classes;
pub mod config;
pub mod cost;
pub mod detection;
pub mod error;
pub mod kalman;
pub mod motion;
pub mod track;
pub mod tracker;

pub use assignment::{AssignmentResult, AssignmentStrategy, GreedySolver, HungarianSolver};
pub use classes::{ClassGate, ClassTable};
pub use config::{FilterNoise, TrackerConfig};
pub use detection::{Detection, Frame};
pub use error::{Result, TrackerError};
pub use motion::MotionModel;
pub use track::{Track, TrackRecord};
pub use tracker::CenterTracker;
