use crate::{utils::time::SampleTime, Error, GrainWindowMode};

// -------------------------------------------------------------------------------------------------

/// An instruction to start a single grain at an absolute sample time.
///
/// Events are created on the control side, e.g. by a [GrainScheduler](crate::GrainScheduler),
/// and get queued in the engine in ascending `start_sample` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Absolute sample frame at which the grain starts.
    pub start_sample: SampleTime,
    /// Length of the grain in sample frames.
    pub duration_samples: u32,
    /// Grain start position in the sample buffer, normalized to `0.0..=1.0`.
    pub start_position: f32,
    /// Playback rate. 1.0 plays at the original pitch, negative values play backwards.
    pub rate: f32,
    /// Linear gain of the left output channel.
    pub gain_left: f32,
    /// Linear gain of the right output channel.
    pub gain_right: f32,
    /// Window of the grain. When `None`, the engine's default window is used.
    pub window: Option<GrainWindowMode>,
}

impl Default for ScheduledEvent {
    fn default() -> Self {
        Self {
            start_sample: 0,
            duration_samples: 1,
            start_position: 0.0,
            rate: 1.0,
            gain_left: 1.0,
            gain_right: 1.0,
            window: None,
        }
    }
}

impl ScheduledEvent {
    /// Create a new centered, unity gain event with the engine's default window.
    pub fn new(start_sample: SampleTime, duration_samples: u32, start_position: f32) -> Self {
        Self {
            start_sample,
            duration_samples,
            start_position,
            ..Self::default()
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_gain(mut self, gain_left: f32, gain_right: f32) -> Self {
        self.gain_left = gain_left;
        self.gain_right = gain_right;
        self
    }

    pub fn with_window(mut self, window: GrainWindowMode) -> Self {
        self.window = Some(window);
        self
    }

    /// Validate all event fields. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.duration_samples == 0 {
            return Err(Error::ParameterError(
                "grain event 'duration_samples' must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.start_position) {
            return Err(Error::ParameterError(format!(
                "grain event 'start_position' value is '{}'",
                self.start_position
            )));
        }
        if !self.rate.is_finite() {
            return Err(Error::ParameterError(format!(
                "grain event 'rate' value is '{}'",
                self.rate
            )));
        }
        if !self.gain_left.is_finite() || !self.gain_right.is_finite() {
            return Err(Error::ParameterError(format!(
                "grain event gain values are '{}' and '{}'",
                self.gain_left, self.gain_right
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(ScheduledEvent::new(0, 100, 0.5).validate().is_ok());
        assert!(ScheduledEvent::new(0, 100, 0.0)
            .with_rate(-2.0)
            .with_window(GrainWindowMode::Blackman)
            .validate()
            .is_ok());

        assert!(ScheduledEvent::new(0, 0, 0.5).validate().is_err());
        assert!(ScheduledEvent::new(0, 100, 1.5).validate().is_err());
        assert!(ScheduledEvent::new(0, 100, f32::NAN).validate().is_err());
        assert!(ScheduledEvent::new(0, 100, 0.5)
            .with_rate(f32::INFINITY)
            .validate()
            .is_err());
        assert!(ScheduledEvent::new(0, 100, 0.5)
            .with_gain(f32::NAN, 1.0)
            .validate()
            .is_err());
    }
}
