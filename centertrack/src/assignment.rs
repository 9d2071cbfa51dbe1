//! Detection-to-track assignment solvers
//!
//! Both solvers take an (n_detections, n_tracks) cost matrix produced by
//! [`crate::cost::gated_distances`] and never return a pair whose cost is at
//! or above [`crate::cost::GATE_THRESHOLD`].

use crate::cost::is_admissible;
use ndarray::ArrayView2;
use pathfinding::prelude::{kuhn_munkres, Matrix};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer scale applied to costs before running Kuhn-Munkres (millimeters)
const COST_SCALE: f64 = 1000.0;
/// Admissible costs are clamped to this many scaled units (about 16 km)
const MAX_ADMISSIBLE_WEIGHT: i64 = 1 << 24;
/// Weight of a gated cell, larger than any sum of admissible weights
const GATED_WEIGHT: i64 = 1 << 40;

/// Assignment strategy, fixed for a tracking session
///
/// Deserialized through [`FromStr`], so names are case-insensitive and
/// `hungarian` is accepted for the optimal solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AssignmentStrategy {
    /// Globally cheapest feasible matching (Hungarian algorithm)
    Optimal,
    /// Cheapest remaining pair first
    Greedy,
}

impl AssignmentStrategy {
    pub fn solve(self, cost_matrix: ArrayView2<f32>) -> AssignmentResult {
        match self {
            Self::Optimal => HungarianSolver::solve(cost_matrix),
            Self::Greedy => GreedySolver::solve(cost_matrix),
        }
    }
}

impl fmt::Display for AssignmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Greedy => write!(f, "greedy"),
        }
    }
}

impl TryFrom<String> for AssignmentStrategy {
    type Error = crate::error::TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for AssignmentStrategy {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimal" | "hungarian" => Ok(Self::Optimal),
            "greedy" => Ok(Self::Greedy),
            other => Err(crate::error::TrackerError::config(format!(
                "unknown assignment strategy '{other}'"
            ))),
        }
    }
}

/// Result of an assignment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentResult {
    /// Matches as (detection_idx, track_idx) pairs, ordered by detection
    pub matches: Vec<(usize, usize)>,
    /// Indices of unmatched detections, ascending
    pub unmatched_detections: Vec<usize>,
    /// Indices of unmatched tracks, ascending
    pub unmatched_tracks: Vec<usize>,
    /// Sum of the costs of all matches
    pub total_cost: f32,
}

impl AssignmentResult {
    fn unmatched(num_detections: usize, num_tracks: usize) -> Self {
        Self {
            matches: Vec::new(),
            unmatched_detections: (0..num_detections).collect(),
            unmatched_tracks: (0..num_tracks).collect(),
            total_cost: 0.0,
        }
    }

    fn from_matches(cost_matrix: ArrayView2<f32>, mut matches: Vec<(usize, usize)>) -> Self {
        let mut used_detections = vec![false; cost_matrix.nrows()];
        let mut used_tracks = vec![false; cost_matrix.ncols()];
        for &(det_idx, track_idx) in &matches {
            used_detections[det_idx] = true;
            used_tracks[track_idx] = true;
        }
        matches.sort_unstable();

        let total_cost = matches
            .iter()
            .map(|&(det_idx, track_idx)| cost_matrix[[det_idx, track_idx]])
            .sum();

        Self {
            matches,
            unmatched_detections: (0..used_detections.len())
                .filter(|&i| !used_detections[i])
                .collect(),
            unmatched_tracks: (0..used_tracks.len()).filter(|&i| !used_tracks[i]).collect(),
            total_cost,
        }
    }
}

/// Optimal assignment via the Hungarian (Kuhn-Munkres) algorithm
pub struct HungarianSolver;

impl HungarianSolver {
    /// Solve the rectangular minimum-cost assignment problem
    ///
    /// Gated cells take part in the optimization (so the number of admissible
    /// pairs is maximized first) but are dropped from the result.
    pub fn solve(cost_matrix: ArrayView2<f32>) -> AssignmentResult {
        let num_detections = cost_matrix.nrows();
        let num_tracks = cost_matrix.ncols();

        if num_detections == 0 || num_tracks == 0 {
            return AssignmentResult::unmatched(num_detections, num_tracks);
        }

        // kuhn_munkres maximizes total weight over a matrix with no more rows
        // than columns, so costs are negated and the matrix padded to square.
        // Padding cells share one weight and cannot change the optimum.
        let size = num_detections.max(num_tracks);
        let mut weights = Matrix::new(size, size, 0i64);
        for ((det_idx, track_idx), &cost) in cost_matrix.indexed_iter() {
            weights[(det_idx, track_idx)] = -Self::weight(cost);
        }

        let (_, raw_assignments) = kuhn_munkres(&weights);

        let matches: Vec<(usize, usize)> = raw_assignments
            .iter()
            .enumerate()
            .filter(|&(det_idx, &track_idx)| {
                det_idx < num_detections
                    && track_idx < num_tracks
                    && is_admissible(cost_matrix[[det_idx, track_idx]])
            })
            .map(|(det_idx, &track_idx)| (det_idx, track_idx))
            .collect();

        AssignmentResult::from_matches(cost_matrix, matches)
    }

    fn weight(cost: f32) -> i64 {
        if !is_admissible(cost) {
            return GATED_WEIGHT;
        }
        let scaled = (f64::from(cost.max(0.0)) * COST_SCALE).round();
        (scaled as i64).min(MAX_ADMISSIBLE_WEIGHT)
    }
}

/// Greedy nearest-first assignment
pub struct GreedySolver;

impl GreedySolver {
    /// Accept the cheapest admissible cell whose row and column are both
    /// unused, repeatedly. Equal costs resolve in row-major order.
    pub fn solve(cost_matrix: ArrayView2<f32>) -> AssignmentResult {
        let num_detections = cost_matrix.nrows();
        let num_tracks = cost_matrix.ncols();

        if num_detections == 0 || num_tracks == 0 {
            return AssignmentResult::unmatched(num_detections, num_tracks);
        }

        let mut candidates: Vec<(f32, usize, usize)> = cost_matrix
            .indexed_iter()
            .filter(|(_, &cost)| is_admissible(cost))
            .map(|((det_idx, track_idx), &cost)| (cost, det_idx, track_idx))
            .collect();

        // Stable sort keeps row-major order among equal costs
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut matches = Vec::new();
        let mut used_detections = vec![false; num_detections];
        let mut used_tracks = vec![false; num_tracks];

        for (_cost, det_idx, track_idx) in candidates {
            if !used_detections[det_idx] && !used_tracks[track_idx] {
                matches.push((det_idx, track_idx));
                used_detections[det_idx] = true;
                used_tracks[track_idx] = true;
            }
        }

        AssignmentResult::from_matches(cost_matrix, matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::GATED_COST;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use rand::prelude::*;

    const X: f32 = GATED_COST;

    fn check_partition(result: &AssignmentResult, costs: &Array2<f32>) {
        let (n, m) = costs.dim();
        assert_eq!(result.matches.len() + result.unmatched_detections.len(), n);
        assert_eq!(result.matches.len() + result.unmatched_tracks.len(), m);

        let mut seen_dets = vec![false; n];
        let mut seen_tracks = vec![false; m];
        for &(d, t) in &result.matches {
            assert!(is_admissible(costs[[d, t]]));
            assert!(!seen_dets[d] && !seen_tracks[t]);
            seen_dets[d] = true;
            seen_tracks[t] = true;
        }
        for &d in &result.unmatched_detections {
            assert!(!seen_dets[d]);
            seen_dets[d] = true;
        }
        for &t in &result.unmatched_tracks {
            assert!(!seen_tracks[t]);
            seen_tracks[t] = true;
        }
        assert!(seen_dets.iter().all(|&s| s));
        assert!(seen_tracks.iter().all(|&s| s));
    }

    #[test]
    fn test_hungarian_beats_greedy() {
        // Greedy grabs (0, 0) first and leaves detection 1 with a 5.0 pair;
        // the optimum is the anti-diagonal with total 2 + 2.
        let costs = array![[1.0, 2.0], [2.0, 5.0]];

        let greedy = GreedySolver::solve(costs.view());
        assert_eq!(greedy.matches, vec![(0, 0), (1, 1)]);
        assert_abs_diff_eq!(greedy.total_cost, 6.0);

        let optimal = HungarianSolver::solve(costs.view());
        assert_eq!(optimal.matches, vec![(0, 1), (1, 0)]);
        assert_abs_diff_eq!(optimal.total_cost, 4.0);
    }

    #[test]
    fn test_gated_pairs_are_dropped() {
        let costs = array![[X, 1.0], [X + 2.0, X]];

        for result in [
            HungarianSolver::solve(costs.view()),
            GreedySolver::solve(costs.view()),
        ] {
            assert_eq!(result.matches, vec![(0, 1)]);
            assert_eq!(result.unmatched_detections, vec![1]);
            assert_eq!(result.unmatched_tracks, vec![0]);
        }
    }

    #[test]
    fn test_hungarian_maximizes_admissible_pairs() {
        // Cheapest single pair is (0, 0), but taking it would strand detection 1
        let costs = array![[0.5, 2.0], [1.0, X]];
        let result = HungarianSolver::solve(costs.view());
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_rectangular_matrices() {
        let wide = array![[3.0, 1.0, 2.0]];
        let result = HungarianSolver::solve(wide.view());
        assert_eq!(result.matches, vec![(0, 1)]);
        assert_eq!(result.unmatched_tracks, vec![0, 2]);

        let tall = array![[3.0], [1.0], [2.0]];
        let result = HungarianSolver::solve(tall.view());
        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_detections, vec![0, 2]);

        let result = GreedySolver::solve(tall.view());
        assert_eq!(result.matches, vec![(1, 0)]);
    }

    #[test]
    fn test_greedy_ties_follow_row_major_order() {
        let costs = array![[1.0, 1.0], [1.0, 1.0]];
        let result = GreedySolver::solve(costs.view());
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_single_finite_entry_agrees() {
        let costs = array![[X, X, X], [X, 0.7, X]];
        let greedy = GreedySolver::solve(costs.view());
        let optimal = HungarianSolver::solve(costs.view());
        assert_eq!(greedy.matches, vec![(1, 1)]);
        assert_eq!(greedy, optimal);
    }

    #[test]
    fn test_empty_dimensions() {
        let no_tracks = Array2::<f32>::zeros((3, 0));
        for strategy in [AssignmentStrategy::Optimal, AssignmentStrategy::Greedy] {
            let result = strategy.solve(no_tracks.view());
            assert!(result.matches.is_empty());
            assert_eq!(result.unmatched_detections, vec![0, 1, 2]);
            assert!(result.unmatched_tracks.is_empty());
        }

        let no_dets = Array2::<f32>::zeros((0, 2));
        let result = HungarianSolver::solve(no_dets.view());
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
    }

    #[test]
    fn test_random_matrices_partition_and_optimality() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(0..7);
            let m = rng.gen_range(0..7);
            let costs = Array2::from_shape_fn((n, m), |_| {
                if rng.gen_bool(0.3) {
                    X
                } else {
                    rng.gen_range(0.0..3.0f32)
                }
            });

            let greedy = GreedySolver::solve(costs.view());
            let optimal = HungarianSolver::solve(costs.view());
            check_partition(&greedy, &costs);
            check_partition(&optimal, &costs);

            // Optimal never matches fewer pairs, and for equal counts never costs more
            assert!(optimal.matches.len() >= greedy.matches.len());
            if optimal.matches.len() == greedy.matches.len() {
                assert!(optimal.total_cost <= greedy.total_cost + 1e-2);
            }
        }
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Hungarian".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::Optimal);
        assert_eq!("greedy".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::Greedy);
        assert!("auction".parse::<AssignmentStrategy>().is_err());
        assert_eq!(AssignmentStrategy::Optimal.to_string(), "optimal");

        let parsed: AssignmentStrategy = serde_json::from_str("\"hungarian\"").unwrap();
        assert_eq!(parsed, AssignmentStrategy::Optimal);
        let parsed: AssignmentStrategy = serde_json::from_str("\"Greedy\"").unwrap();
        assert_eq!(parsed, AssignmentStrategy::Greedy);
        assert!(serde_json::from_str::<AssignmentStrategy>("\"auction\"").is_err());
    }
}
