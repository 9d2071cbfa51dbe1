//! Linear Kalman filter

use crate::error::{Result, TrackerError};
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone)]
pub struct KalmanFilterParams {
    pub dim_x: usize,    // State dimension
    pub dim_z: usize,    // Observation dimension
    pub x: DVector<f32>, // Initial state
    pub p: DMatrix<f32>, // Initial state covariance
    pub f: DMatrix<f32>, // State transition matrix
    pub h: DMatrix<f32>, // Observation matrix
    pub r: DMatrix<f32>, // Observation noise covariance
    pub q: DMatrix<f32>, // Process noise covariance
}

#[derive(Debug, Clone)]
pub struct KalmanFilter<T> {
    pub dim_x: usize,
    pub dim_z: usize,
    pub x: DVector<T>, // State vector
    pub p: DMatrix<T>, // State covariance matrix
    pub f: DMatrix<T>, // State transition matrix
    pub h: DMatrix<T>, // Observation matrix
    pub r: DMatrix<T>, // Observation noise covariance
    pub q: DMatrix<T>, // Process noise covariance
    pub y: DVector<T>, // Residual
    pub s: DMatrix<T>, // Innovation covariance
    pub k: DMatrix<T>, // Kalman gain
}

impl KalmanFilter<f32> {
    pub fn new(params: KalmanFilterParams) -> Self {
        let dim_x = params.dim_x;
        let dim_z = params.dim_z;

        Self {
            dim_x,
            dim_z,
            x: params.x,
            p: params.p,
            f: params.f,
            h: params.h,
            r: params.r,
            q: params.q,
            y: DVector::zeros(dim_z),
            s: DMatrix::zeros(dim_z, dim_z),
            k: DMatrix::zeros(dim_x, dim_z),
        }
    }

    /// Predict the next state with the stored transition matrix
    pub fn predict(&mut self) {
        // x = F * x
        self.x = &self.f * &self.x;

        // P = F * P * F^T + Q
        self.p = &self.f * &self.p * self.f.transpose() + &self.q;
    }

    /// Replace the transition matrix, then predict
    ///
    /// Used when the transition depends on the elapsed time of each step.
    pub fn predict_with(&mut self, f: DMatrix<f32>) {
        self.f = f;
        self.predict();
    }

    /// Update with an observation of the stored observation model
    pub fn update(&mut self, z: DVector<f32>) -> Result<()> {
        let h = self.h.clone();
        let r = self.r.clone();
        self.update_with(z, &h, &r)
    }

    /// Update with an observation through an explicit observation model
    ///
    /// Covariance is updated in Joseph form, which keeps P symmetric positive
    /// semi-definite under rounding.
    pub fn update_with(&mut self, z: DVector<f32>, h: &DMatrix<f32>, r: &DMatrix<f32>) -> Result<()> {
        if z.len() != h.nrows() || h.ncols() != self.dim_x || r.nrows() != h.nrows() {
            return Err(TrackerError::filter(format!(
                "observation of size {} does not fit a {}x{} observation matrix",
                z.len(),
                h.nrows(),
                h.ncols()
            )));
        }

        // Residual: y = z - H * x
        self.y = z - h * &self.x;

        // Innovation covariance: S = H * P * H^T + R
        self.s = h * &self.p * h.transpose() + r;

        // Kalman gain: K = P * H^T * S^-1
        let s_inv = self
            .s
            .clone()
            .try_inverse()
            .ok_or_else(|| TrackerError::filter("Failed to invert innovation covariance matrix"))?;
        self.k = &self.p * h.transpose() * s_inv;

        // Update state: x = x + K * y
        self.x = &self.x + &self.k * &self.y;

        // Update covariance: P = (I - K * H) * P * (I - K * H)^T + K * R * K^T
        let i_kh = DMatrix::identity(self.dim_x, self.dim_x) - &self.k * h;
        self.p = &i_kh * &self.p * i_kh.transpose() + &self.k * r * self.k.transpose();

        Ok(())
    }

    /// Get current state
    pub fn get_state(&self) -> &DVector<f32> {
        &self.x
    }

    /// Get current covariance
    pub fn get_covariance(&self) -> &DMatrix<f32> {
        &self.p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn position_velocity_filter() -> KalmanFilter<f32> {
        KalmanFilter::new(KalmanFilterParams {
            dim_x: 2,                                                            // [position, velocity]
            dim_z: 1,                                                            // [position]
            x: DVector::from_vec(vec![0.0, 1.0]), // initial position=0, velocity=1
            p: DMatrix::from_diagonal(&DVector::from_vec(vec![1000.0, 1000.0])), // high initial uncertainty
            f: DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 1.0]), // x' = x + v, v' = v
            h: DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),           // observe position only
            r: DMatrix::from_element(1, 1, 0.1),                     // measurement noise
            q: DMatrix::from_diagonal(&DVector::from_vec(vec![0.01, 0.01])), // process noise
        })
    }

    #[test]
    fn test_kalman_filter_basic() {
        let mut kf = position_velocity_filter();

        kf.predict();
        assert_abs_diff_eq!(kf.x[0], 1.0, epsilon = 0.001);

        kf.update(DVector::from_vec(vec![0.9])).unwrap();

        // State should be somewhere between prediction and measurement
        assert!(kf.x[0] > 0.8 && kf.x[0] < 1.0);
    }

    #[test]
    fn test_predict_with_replaces_transition() {
        let mut kf = position_velocity_filter();
        kf.predict_with(DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]));
        assert_abs_diff_eq!(kf.x[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(kf.f[(0, 1)], 0.5);
    }

    #[test]
    fn test_covariance_stays_symmetric() {
        let mut kf = position_velocity_filter();
        for step in 0..20 {
            kf.predict();
            kf.update(DVector::from_vec(vec![step as f32])).unwrap();
        }
        let p = kf.get_covariance();
        assert_abs_diff_eq!(p[(0, 1)], p[(1, 0)], epsilon = 1e-4);
        assert!(p[(0, 0)] > 0.0 && p[(1, 1)] > 0.0);
    }

    #[test]
    fn test_mismatched_observation_is_rejected() {
        let mut kf = position_velocity_filter();
        let result = kf.update(DVector::from_vec(vec![1.0, 2.0]));
        assert!(matches!(result, Err(TrackerError::FilterError(_))));
    }
}
