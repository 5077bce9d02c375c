//! Sample time, buffer and conversion helpers.

pub mod buffer;
pub mod time;

// -------------------------------------------------------------------------------------------------

/// Equal power panning factors for the given panning position in range -1.0..=1.0,
/// where -1.0 is hard left, 0.0 center and 1.0 hard right.
pub fn panning_factors(pan: f32) -> (f32, f32) {
    debug_assert!((-1.0..=1.0).contains(&pan), "Invalid panning factor");
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// Playback speed factor of the given transposition in semitones.
pub fn speed_from_semitones(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panning() {
        let (left, right) = panning_factors(0.0);
        assert!((left - right).abs() < 1e-6);
        assert!((left * left + right * right - 1.0).abs() < 1e-6);

        let (left, right) = panning_factors(-1.0);
        assert!((left - 1.0).abs() < 1e-6 && right.abs() < 1e-6);
        let (left, right) = panning_factors(1.0);
        assert!(left.abs() < 1e-6 && (right - 1.0).abs() < 1e-6);
    }

    #[test]
    fn transposition() {
        assert_eq!(speed_from_semitones(0.0), 1.0);
        assert!((speed_from_semitones(12.0) - 2.0).abs() < 1e-6);
        assert!((speed_from_semitones(-12.0) - 0.5).abs() < 1e-6);
    }
}
