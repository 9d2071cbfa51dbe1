//! Center-point multi-object tracker
//!
//! Each call to [`CenterTracker::process_frame`] runs one association step:
//! predict live tracks, build the gated cost matrix against the frame's
//! detections, solve the assignment, then continue matched tracks, give birth
//! to unmatched detections and age (or drop) unmatched tracks.

use crate::classes::ClassTable;
use crate::config::TrackerConfig;
use crate::cost::{gated_distances, Anchor};
use crate::detection::{Detection, Observation};
use crate::error::{Result, TrackerError};
use crate::motion::MotionPropagator;
use crate::track::{Track, TrackRecord};
use rayon::prelude::*;

/// Multi-object tracker over planar object centers
#[derive(Debug, Clone)]
pub struct CenterTracker {
    config: TrackerConfig,
    classes: ClassTable,
    propagator: MotionPropagator,
    tracks: Vec<Track>,
    /// Number of identities handed out this session
    id_count: u32,
    n_steps: u32,
}

impl CenterTracker {
    /// Create a tracker, validating the configuration
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let classes = config.class_table()?;
        let propagator = MotionPropagator::new(
            config.motion_model,
            config.filter.clone(),
            config.use_velocity,
        );

        log::info!(
            "Center tracker initialized: {} assignment, {} motion model, {} tracked classes, max_age {}",
            config.strategy,
            propagator.model(),
            classes.len(),
            config.max_age
        );

        Ok(Self {
            config,
            classes,
            propagator,
            tracks: Vec::new(),
            id_count: 0,
            n_steps: 0,
        })
    }

    /// Drop every track and restart identities from 1
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.id_count = 0;
        self.n_steps = 0;
    }

    /// Process one frame of detections
    ///
    /// `time_lag` is the time in seconds since the previous frame. A negative
    /// or non-finite lag fails the call without touching tracker state.
    /// Detections of untracked classes and malformed detections are skipped.
    pub fn process_frame(&mut self, detections: &[Detection], time_lag: f32) -> Result<Vec<TrackRecord>> {
        if !time_lag.is_finite() || time_lag < 0.0 {
            return Err(TrackerError::InvalidTimeLag(time_lag));
        }
        self.n_steps += 1;

        let observations = self.admit(detections);

        // No admissible detections: every track is considered lost
        if observations.is_empty() {
            if !self.tracks.is_empty() {
                log::debug!(
                    "Frame {}: no admissible detections, dropping {} tracks",
                    self.n_steps,
                    self.tracks.len()
                );
            }
            self.tracks.clear();
            return Ok(Vec::new());
        }

        if self.tracks.is_empty() {
            let min_hits = self.config.min_hits;
            let mut born = Vec::with_capacity(observations.len());
            for obs in &observations {
                let motion = self.propagator.init(obs.center, obs.velocity, time_lag);
                let id = self.allocate_id();
                born.push(Track::born(id, obs, motion, min_hits));
            }
            log::debug!("Frame {}: started {} tracks", self.n_steps, born.len());
            self.tracks = born;
            return Ok(self.records());
        }

        self.step(&observations, time_lag);
        Ok(self.records())
    }

    fn step(&mut self, observations: &[Observation<'_>], time_lag: f32) {
        let mut prior = std::mem::take(&mut self.tracks);

        // Step 1: Predict where every live track is now
        let propagator = &self.propagator;
        let track_anchors: Vec<Anchor> = prior
            .par_iter_mut()
            .map(|track| {
                let position = track.position();
                let predicted = propagator.predict(&mut track.motion, position, time_lag);
                Anchor::new(predicted, track.class_idx)
            })
            .collect();

        let detection_anchors: Vec<Anchor> = observations
            .iter()
            .map(|obs| {
                Anchor::new(
                    propagator.detection_anchor(obs.center, obs.velocity, time_lag),
                    obs.class_idx,
                )
            })
            .collect();

        // Step 2: Associate detections with tracks
        let costs = gated_distances(&detection_anchors, &track_anchors, &self.classes);
        let assignment = self.config.strategy.solve(costs.view());

        let mut prior: Vec<Option<Track>> = prior.drain(..).map(Some).collect();
        let mut next = Vec::with_capacity(observations.len() + prior.len());

        // Step 3: Continue matched tracks
        for &(det_idx, track_idx) in &assignment.matches {
            let Some(mut track) = prior[track_idx].take() else {
                continue;
            };
            let obs = &observations[det_idx];
            let kinematics = self
                .propagator
                .correct(&mut track.motion, obs.center, obs.velocity, time_lag);
            track.absorb(obs, kinematics);
            next.push(track);
        }

        // Step 4: Unmatched detections start new tracks
        for &det_idx in &assignment.unmatched_detections {
            let obs = &observations[det_idx];
            let active = u32::from(obs.detection.score > self.config.detection_threshold);
            let motion = self.propagator.init(obs.center, obs.velocity, time_lag);
            let id = self.allocate_id();
            next.push(Track::born(id, obs, motion, active));
        }

        // Step 5: Age unmatched tracks, dropping the stale ones
        let mut dropped = 0usize;
        for &track_idx in &assignment.unmatched_tracks {
            let Some(mut track) = prior[track_idx].take() else {
                continue;
            };

            if let Some(decay) = self.config.score_decay {
                track.score -= decay;
            }

            if track.age < self.config.max_age && track.score > self.config.deletion_threshold {
                track.age += 1;
                track.active = if track.score > self.config.activation_threshold {
                    track.active + 1
                } else {
                    0
                };
                let kinematics = self
                    .propagator
                    .coast(&track.motion, track.position(), track.velocity);
                track.set_kinematics(kinematics);
                next.push(track);
            } else {
                log::trace!(
                    "Dropping track {} (age {}, score {:.3})",
                    track.id,
                    track.age,
                    track.score
                );
                dropped += 1;
            }
        }

        log::debug!(
            "Frame {}: {} matched, {} born, {} coasting, {} dropped (cost {:.2})",
            self.n_steps,
            assignment.matches.len(),
            assignment.unmatched_detections.len(),
            assignment.unmatched_tracks.len() - dropped,
            dropped,
            assignment.total_cost
        );

        self.tracks = next;
    }

    /// Keep detections of tracked classes with well-formed fields
    fn admit<'a>(&self, detections: &'a [Detection]) -> Vec<Observation<'a>> {
        detections
            .iter()
            .enumerate()
            .filter_map(|(det_idx, detection)| {
                let Some(class_idx) = self.classes.index_of(&detection.class_name) else {
                    log::trace!(
                        "Skipping detection {det_idx}: class '{}' is not tracked",
                        detection.class_name
                    );
                    return None;
                };
                if let Some(reason) = detection.malformed_reason() {
                    log::warn!("Skipping malformed detection {det_idx}: {reason}");
                    return None;
                }
                let center = detection.center()?;
                Some(Observation {
                    detection,
                    center,
                    velocity: detection.planar_velocity(),
                    class_idx,
                })
            })
            .collect()
    }

    fn allocate_id(&mut self) -> u32 {
        self.id_count += 1;
        self.id_count
    }

    fn records(&self) -> Vec<TrackRecord> {
        self.tracks.iter().map(Track::record).collect()
    }

    /// Live tracks retained for the next frame
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Number of frames processed since construction or the last reset
    pub fn step_count(&self) -> u32 {
        self.n_steps
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn class_table(&self) -> &ClassTable {
        &self.classes
    }
}
