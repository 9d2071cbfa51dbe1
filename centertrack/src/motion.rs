//! Per-track motion models
//!
//! Two models are available for a session:
//! - `Point`: constant-velocity offsets. Detections are projected back by
//!   their own velocity to where a continuing track would have been, and
//!   unmatched tracks coast forward by their last offset.
//! - `Filter`: a Kalman filter over `[x, y, vx, vy, ax, ay]` with an
//!   elapsed-time transition and position (optionally velocity) updates.

use crate::config::FilterNoise;
use crate::error::{Result, TrackerError};
use crate::kalman::{KalmanFilter, KalmanFilterParams};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const STATE_DIM: usize = 6;

/// Motion model selection, fixed for a tracking session
///
/// Deserialized through [`FromStr`], so names are case-insensitive and the
/// `PointTracker`/`KF` spellings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MotionModel {
    /// Constant-velocity point offsets
    Point,
    /// Kalman filter predict/update
    Filter,
}

impl TryFrom<String> for MotionModel {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for MotionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Filter => write!(f, "filter"),
        }
    }
}

impl FromStr for MotionModel {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" | "pointtracker" => Ok(Self::Point),
            "filter" | "kf" | "kalman" => Ok(Self::Filter),
            other => Err(TrackerError::config(format!("unknown motion model '{other}'"))),
        }
    }
}

/// Kalman filter tracking a planar center with velocity and acceleration
#[derive(Debug, Clone)]
pub struct CenterKalman {
    kf: KalmanFilter<f32>,
    use_velocity: bool,
    measurement_noise: f32,
}

impl CenterKalman {
    pub fn new(position: [f32; 2], velocity: [f32; 2], noise: &FilterNoise, use_velocity: bool) -> Self {
        let dim_z = if use_velocity { 4 } else { 2 };

        let params = KalmanFilterParams {
            dim_x: STATE_DIM,
            dim_z,
            x: DVector::from_vec(vec![
                position[0],
                position[1],
                velocity[0],
                velocity[1],
                0.0,
                0.0,
            ]),
            p: DMatrix::<f32>::identity(STATE_DIM, STATE_DIM) * noise.initial_covariance,
            f: Self::transition(0.0),
            h: Self::observation_matrix(dim_z),
            r: DMatrix::<f32>::identity(dim_z, dim_z) * noise.measurement_noise,
            q: DMatrix::<f32>::identity(STATE_DIM, STATE_DIM) * noise.process_noise,
        };

        Self {
            kf: KalmanFilter::new(params),
            use_velocity,
            measurement_noise: noise.measurement_noise,
        }
    }

    /// State transition for `dt` seconds
    #[rustfmt::skip]
    pub fn transition(dt: f32) -> DMatrix<f32> {
        let dt2 = dt * dt;
        DMatrix::from_row_slice(
            STATE_DIM,
            STATE_DIM,
            &[
                1.0, 0.0, dt,  0.0, dt2, 0.0, // x' = x + vx * dt + ax * dt^2
                0.0, 1.0, 0.0, dt,  0.0, dt2, // y' = y + vy * dt + ay * dt^2
                0.0, 0.0, 1.0, 0.0, dt,  0.0, // vx' = vx + ax * dt
                0.0, 0.0, 0.0, 1.0, 0.0, dt,  // vy' = vy + ay * dt
                0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // ax' = ax
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0, // ay' = ay
            ],
        )
    }

    /// Selects the leading `dim_z` state components (position, then velocity)
    fn observation_matrix(dim_z: usize) -> DMatrix<f32> {
        DMatrix::from_fn(dim_z, STATE_DIM, |row, col| if row == col { 1.0 } else { 0.0 })
    }

    /// Advance the state by `dt` seconds and return the predicted position
    pub fn predict(&mut self, dt: f32) -> [f32; 2] {
        self.kf.predict_with(Self::transition(dt));
        self.position()
    }

    /// Correct the state with an observed position and, when enabled and
    /// available, an observed velocity
    pub fn update(&mut self, position: [f32; 2], velocity: Option<[f32; 2]>) -> Result<()> {
        match velocity.filter(|_| self.use_velocity) {
            Some(velocity) => {
                let z = DVector::from_vec(vec![position[0], position[1], velocity[0], velocity[1]]);
                self.kf.update(z)
            }
            None if self.use_velocity => {
                // Velocity observations are configured but this detection has none
                let h = Self::observation_matrix(2);
                let r = DMatrix::<f32>::identity(2, 2) * self.measurement_noise;
                self.kf
                    .update_with(DVector::from_vec(vec![position[0], position[1]]), &h, &r)
            }
            None => self.kf.update(DVector::from_vec(vec![position[0], position[1]])),
        }
    }

    pub fn position(&self) -> [f32; 2] {
        let x = self.kf.get_state();
        [x[0], x[1]]
    }

    pub fn velocity(&self) -> [f32; 2] {
        let x = self.kf.get_state();
        [x[2], x[3]]
    }

    pub fn covariance(&self) -> &DMatrix<f32> {
        self.kf.get_covariance()
    }
}

/// Motion state carried by a single track
#[derive(Debug, Clone)]
pub enum MotionState {
    /// Displacement `-(velocity * dt)` recorded at the last refresh
    Offset([f32; 2]),
    Filter(Box<CenterKalman>),
}

/// Position and velocity to write back onto a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: [f32; 2],
    pub velocity: Option<[f32; 2]>,
}

/// Applies the session's motion model to track states
#[derive(Debug, Clone)]
pub struct MotionPropagator {
    model: MotionModel,
    noise: FilterNoise,
    use_velocity: bool,
}

impl MotionPropagator {
    pub fn new(model: MotionModel, noise: FilterNoise, use_velocity: bool) -> Self {
        Self {
            model,
            noise,
            use_velocity,
        }
    }

    pub fn model(&self) -> MotionModel {
        self.model
    }

    fn offset(velocity: Option<[f32; 2]>, dt: f32) -> [f32; 2] {
        let [vx, vy] = velocity.unwrap_or([0.0, 0.0]);
        [-vx * dt, -vy * dt]
    }

    /// Motion state of a track born from a detection
    pub fn init(&self, center: [f32; 2], velocity: Option<[f32; 2]>, dt: f32) -> MotionState {
        match self.model {
            MotionModel::Point => MotionState::Offset(Self::offset(velocity, dt)),
            MotionModel::Filter => MotionState::Filter(Box::new(CenterKalman::new(
                center,
                velocity.unwrap_or([0.0, 0.0]),
                &self.noise,
                self.use_velocity,
            ))),
        }
    }

    /// Position a detection is compared at in the cost matrix
    pub fn detection_anchor(&self, center: [f32; 2], velocity: Option<[f32; 2]>, dt: f32) -> [f32; 2] {
        match self.model {
            MotionModel::Point => {
                let offset = Self::offset(velocity, dt);
                [center[0] + offset[0], center[1] + offset[1]]
            }
            MotionModel::Filter => center,
        }
    }

    /// Advance a live track to the current frame and return the position it
    /// is compared at in the cost matrix
    pub fn predict(&self, state: &mut MotionState, position: [f32; 2], dt: f32) -> [f32; 2] {
        match state {
            MotionState::Offset(_) => position,
            MotionState::Filter(kf) => kf.predict(dt),
        }
    }

    /// Fold a matched detection into a track's motion state
    ///
    /// A filter whose update fails is restarted from the detection.
    pub fn correct(
        &self,
        state: &mut MotionState,
        center: [f32; 2],
        velocity: Option<[f32; 2]>,
        dt: f32,
    ) -> Kinematics {
        match state {
            MotionState::Offset(offset) => {
                *offset = Self::offset(velocity, dt);
                Kinematics {
                    position: center,
                    velocity,
                }
            }
            MotionState::Filter(kf) => {
                if let Err(e) = kf.update(center, velocity) {
                    log::warn!("Kalman update failed ({e}), restarting filter from detection");
                    **kf = CenterKalman::new(
                        center,
                        velocity.unwrap_or([0.0, 0.0]),
                        &self.noise,
                        self.use_velocity,
                    );
                }
                Kinematics {
                    position: kf.position(),
                    velocity: Some(kf.velocity()),
                }
            }
        }
    }

    /// Extrapolate an unmatched track by one frame
    pub fn coast(&self, state: &MotionState, position: [f32; 2], velocity: Option<[f32; 2]>) -> Kinematics {
        match state {
            MotionState::Offset(offset) => Kinematics {
                position: [position[0] - offset[0], position[1] - offset[1]],
                velocity,
            },
            MotionState::Filter(kf) => Kinematics {
                position: kf.position(),
                velocity: Some(kf.velocity()),
            },
        }
    }
}
