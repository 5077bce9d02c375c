//! Grain window (amplitude envelope) functions.

use std::f32::consts::PI;

// -------------------------------------------------------------------------------------------------

/// Standard deviation of the [GrainWindowMode::Gaussian] window, relative to the grain length.
pub const GAUSSIAN_SIGMA: f32 = 0.4;

// -------------------------------------------------------------------------------------------------

/// Grain window mode selection.
///
/// Each scheduled grain may carry its own window mode. Grains without one use the engine's
/// default window, which can be changed at runtime.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GrainWindowMode {
    /// Raised cosine. Zero at the edges, one at the midpoint.
    #[default]
    Hann = 0,
    /// Bell curve with a fixed sigma of [GAUSSIAN_SIGMA]. Does not fully reach zero at the edges.
    Gaussian = 1,
    /// Three-term cosine sum with a steeper spectral rolloff than Hann.
    Blackman = 2,
    /// No windowing at all. Clicks at the grain edges, which is useful for harsh textures.
    #[strum(to_string = "Rectangular", serialize = "rect")]
    #[serde(alias = "rect")]
    Rectangular = 3,
}

impl GrainWindowMode {
    /// Evaluate the window at the given normalized grain phase.
    ///
    /// `phase01` is clamped into the range `0.0..=1.0`, so the result always is a valid
    /// amplitude in range `0.0..=1.0`.
    #[inline]
    pub fn evaluate(self, phase01: f32) -> f32 {
        match self {
            GrainWindowMode::Hann => hann(phase01),
            GrainWindowMode::Gaussian => gaussian(phase01),
            GrainWindowMode::Blackman => blackman(phase01),
            GrainWindowMode::Rectangular => rectangular(phase01),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Hann window: `0.5 - 0.5 * cos(2π * phase)`.
#[inline]
pub fn hann(phase01: f32) -> f32 {
    let phase = phase01.clamp(0.0, 1.0);
    (0.5 - 0.5 * (2.0 * PI * phase).cos()).clamp(0.0, 1.0)
}

/// Gaussian window: `exp(-0.5 * ((phase - 0.5) / σ)²)` with σ = [GAUSSIAN_SIGMA].
#[inline]
pub fn gaussian(phase01: f32) -> f32 {
    let phase = phase01.clamp(0.0, 1.0);
    let x = (phase - 0.5) / GAUSSIAN_SIGMA;
    (-0.5 * x * x).exp()
}

/// Blackman window with the standard a0=0.42, a1=0.5, a2=0.08 coefficients.
#[inline]
pub fn blackman(phase01: f32) -> f32 {
    let phase = phase01.clamp(0.0, 1.0);
    let pi_phase = PI * phase;
    // the coefficients sum up to zero at the edges, but rounding may undershoot
    (0.42 - 0.5 * (2.0 * pi_phase).cos() + 0.08 * (4.0 * pi_phase).cos()).clamp(0.0, 1.0)
}

/// Rectangular window: constant 1.
#[inline]
pub fn rectangular(_phase01: f32) -> f32 {
    1.0
}

// -------------------------------------------------------------------------------------------------
