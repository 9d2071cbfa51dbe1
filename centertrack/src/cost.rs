//! Gated distance matrix between detections and predicted tracks

use crate::classes::ClassTable;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Cost added to pairs that fail the class or distance gate
pub const GATED_COST: f32 = 1e18;

/// Cells at or above this cost are never accepted as matches
pub const GATE_THRESHOLD: f32 = 1e16;

/// Planar position tagged with a class index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub position: [f32; 2],
    pub class_idx: usize,
}

impl Anchor {
    pub fn new(position: [f32; 2], class_idx: usize) -> Self {
        Self {
            position,
            class_idx,
        }
    }
}

/// Whether a cost matrix cell may be used as a match
#[inline]
pub fn is_admissible(cost: f32) -> bool {
    cost < GATE_THRESHOLD
}

/// Euclidean distance in the ground plane
#[inline]
pub fn planar_distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Compute the (n_detections, n_tracks) cost matrix
///
/// A pair is gated when the classes differ or when the distance exceeds the
/// detection class's gate; gated pairs carry `GATED_COST` on top of their
/// distance. Detections whose class index is not in the table are gated
/// against every track.
pub fn gated_distances(detections: &[Anchor], tracks: &[Anchor], classes: &ClassTable) -> Array2<f32> {
    let n_dets = detections.len();
    let n_tracks = tracks.len();

    if n_dets == 0 || n_tracks == 0 {
        return Array2::zeros((n_dets, n_tracks));
    }

    let costs: Vec<f32> = detections
        .par_iter()
        .flat_map_iter(|det| {
            let gate = classes.gate(det.class_idx);
            tracks.iter().map(move |track| {
                let dist = planar_distance(det.position, track.position);
                let within_gate = gate.is_some_and(|gate| dist <= gate);
                if !within_gate || det.class_idx != track.class_idx {
                    dist + GATED_COST
                } else {
                    dist
                }
            })
        })
        .collect();

    Array2::from_shape_vec((n_dets, n_tracks), costs)
        .expect("cost buffer holds exactly n_dets * n_tracks entries")
}
