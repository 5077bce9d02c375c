use std::time::Duration;

// -------------------------------------------------------------------------------------------------

/// Absolute sample frame position, as counted by the engine's clock.
pub type SampleTime = u64;

// -------------------------------------------------------------------------------------------------

/// Convert a duration to sample frames with the given sample rate.
pub fn duration_to_sample_time(duration: Duration, sample_rate: u32) -> SampleTime {
    debug_assert!(sample_rate > 0, "Invalid sample rate");
    (duration.as_secs_f64() * sample_rate as f64).round() as SampleTime
}

/// Convert sample frames to a duration with the given sample rate.
pub fn sample_time_to_duration(sample_time: SampleTime, sample_rate: u32) -> Duration {
    debug_assert!(sample_rate > 0, "Invalid sample rate");
    Duration::from_secs_f64(sample_time as f64 / sample_rate as f64)
}

/// Convert a time in milliseconds to a (fractional) number of sample frames.
pub fn milliseconds_to_samples(milliseconds: f32, sample_rate: u32) -> f64 {
    milliseconds as f64 * sample_rate as f64 / 1000.0
}

// -------------------------------------------------------------------------------------------------
