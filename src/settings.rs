//! Control side granular parameter record, its per mode ranges and guardrails.

use four_cc::FourCC;
use serde::{Deserialize, Serialize};

use crate::{Error, GrainWindowMode};

// -------------------------------------------------------------------------------------------------

mod ranges;
pub mod store;

pub use ranges::{get_ranges, FloatParameter, ParameterRanges, CINEMATIC_RANGES, DESIGN_RANGES};

// -------------------------------------------------------------------------------------------------

/// Selects the parameter ranges and guardrails of [`GranularSettings`].
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Narrower ranges plus anti-mud rules, biased toward musically safe results.
    #[default]
    Cinematic,
    /// Full numeric ranges without guardrails.
    Design,
}

// -------------------------------------------------------------------------------------------------

/// The full control side granular parameter record.
///
/// Settings are never read by the engine directly: a [GrainScheduler](crate::GrainScheduler)
/// derives [ScheduledEvent](crate::ScheduledEvent)s from them. Mutations should be committed
/// via [`commit`], which clamps all values into the mode's ranges and applies the mode's
/// anti-mud rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranularSettings {
    pub mode: OperatingMode,
    // timing
    pub grain_size_ms: f32,
    pub density_hz: f32,
    // position and scan
    pub position: f32,
    pub spray: f32,
    pub scan_speed: f32,
    // pitch
    pub pitch_semitones: f32,
    pub pitch_random_semitones: f32,
    // window shape
    pub window: GrainWindowMode,
    // stereo
    pub stereo_spread: f32,
    // grain envelope
    pub amplitude_variance: f32,
    // post processing
    pub output_gain: f32,
    pub low_cut_hz: f32,
    pub high_cut_hz: f32,
    // randomization
    pub seed: u64,
}

impl Default for GranularSettings {
    fn default() -> Self {
        Self::defaults(OperatingMode::Cinematic)
    }
}

impl GranularSettings {
    /// Default seed of new settings.
    pub const DEFAULT_SEED: u64 = 0x5EED;

    /// Default settings of the given mode.
    pub fn defaults(mode: OperatingMode) -> Self {
        let ranges = get_ranges(mode);
        Self {
            mode,
            grain_size_ms: ranges.grain_size_ms.default_value(),
            density_hz: ranges.density_hz.default_value(),
            position: ranges.position.default_value(),
            spray: ranges.spray.default_value(),
            scan_speed: ranges.scan_speed.default_value(),
            pitch_semitones: ranges.pitch_semitones.default_value(),
            pitch_random_semitones: ranges.pitch_random_semitones.default_value(),
            window: GrainWindowMode::default(),
            stereo_spread: ranges.stereo_spread.default_value(),
            amplitude_variance: ranges.amplitude_variance.default_value(),
            output_gain: ranges.output_gain.default_value(),
            low_cut_hz: ranges.low_cut_hz.default_value(),
            high_cut_hz: ranges.high_cut_hz.default_value(),
            seed: Self::DEFAULT_SEED,
        }
    }

    /// Switch the operating mode and commit the settings in the new mode.
    pub fn with_mode(&self, mode: OperatingMode) -> Self {
        commit(&Self {
            mode,
            ..self.clone()
        })
    }

    /// Read a ranged field by its parameter id.
    pub fn parameter(&self, id: FourCC) -> Option<f32> {
        match id {
            _ if id == ParameterRanges::GRAIN_SIZE => Some(self.grain_size_ms),
            _ if id == ParameterRanges::DENSITY => Some(self.density_hz),
            _ if id == ParameterRanges::POSITION => Some(self.position),
            _ if id == ParameterRanges::SPRAY => Some(self.spray),
            _ if id == ParameterRanges::SCAN_SPEED => Some(self.scan_speed),
            _ if id == ParameterRanges::PITCH => Some(self.pitch_semitones),
            _ if id == ParameterRanges::PITCH_RANDOM => Some(self.pitch_random_semitones),
            _ if id == ParameterRanges::STEREO_SPREAD => Some(self.stereo_spread),
            _ if id == ParameterRanges::AMPLITUDE_VARIANCE => Some(self.amplitude_variance),
            _ if id == ParameterRanges::OUTPUT_GAIN => Some(self.output_gain),
            _ if id == ParameterRanges::LOW_CUT => Some(self.low_cut_hz),
            _ if id == ParameterRanges::HIGH_CUT => Some(self.high_cut_hz),
            _ => None,
        }
    }

    /// Set a ranged field by its parameter id. The value gets clamped into the current mode's
    /// range. Anti-mud rules are not applied: use [`commit`] for this.
    pub fn set_parameter(&mut self, id: FourCC, value: f32) -> Result<(), Error> {
        let descriptor = get_ranges(self.mode)
            .parameter(id)
            .ok_or_else(|| Error::ParameterError(format!("unknown settings parameter '{id}'")))?;
        let value = descriptor.clamp_value(value);
        let field = self.field_mut(id).ok_or_else(|| {
            Error::ParameterError(format!("unknown settings parameter '{id}'"))
        })?;
        *field = value;
        Ok(())
    }

    /// Set a ranged field by its parameter id from a normalized 0.0-1.0 value, which gets
    /// mapped into the current mode's range.
    pub fn set_parameter_normalized(&mut self, id: FourCC, normalized: f32) -> Result<(), Error> {
        let descriptor = get_ranges(self.mode)
            .parameter(id)
            .ok_or_else(|| Error::ParameterError(format!("unknown settings parameter '{id}'")))?;
        self.set_parameter(id, descriptor.denormalize_value(normalized))
    }

    fn field_mut(&mut self, id: FourCC) -> Option<&mut f32> {
        match id {
            _ if id == ParameterRanges::GRAIN_SIZE => Some(&mut self.grain_size_ms),
            _ if id == ParameterRanges::DENSITY => Some(&mut self.density_hz),
            _ if id == ParameterRanges::POSITION => Some(&mut self.position),
            _ if id == ParameterRanges::SPRAY => Some(&mut self.spray),
            _ if id == ParameterRanges::SCAN_SPEED => Some(&mut self.scan_speed),
            _ if id == ParameterRanges::PITCH => Some(&mut self.pitch_semitones),
            _ if id == ParameterRanges::PITCH_RANDOM => Some(&mut self.pitch_random_semitones),
            _ if id == ParameterRanges::STEREO_SPREAD => Some(&mut self.stereo_spread),
            _ if id == ParameterRanges::AMPLITUDE_VARIANCE => Some(&mut self.amplitude_variance),
            _ if id == ParameterRanges::OUTPUT_GAIN => Some(&mut self.output_gain),
            _ if id == ParameterRanges::LOW_CUT => Some(&mut self.low_cut_hz),
            _ if id == ParameterRanges::HIGH_CUT => Some(&mut self.high_cut_hz),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Returns a copy of the given settings with every ranged field clamped into the active
/// mode's range. NaN values resolve to the field's default value.
pub fn clamp_to_mode(settings: &GranularSettings) -> GranularSettings {
    let ranges = get_ranges(settings.mode);
    GranularSettings {
        grain_size_ms: ranges.grain_size_ms.clamp_value(settings.grain_size_ms),
        density_hz: ranges.density_hz.clamp_value(settings.density_hz),
        position: ranges.position.clamp_value(settings.position),
        spray: ranges.spray.clamp_value(settings.spray),
        scan_speed: ranges.scan_speed.clamp_value(settings.scan_speed),
        pitch_semitones: ranges.pitch_semitones.clamp_value(settings.pitch_semitones),
        pitch_random_semitones: ranges
            .pitch_random_semitones
            .clamp_value(settings.pitch_random_semitones),
        stereo_spread: ranges.stereo_spread.clamp_value(settings.stereo_spread),
        amplitude_variance: ranges
            .amplitude_variance
            .clamp_value(settings.amplitude_variance),
        output_gain: ranges.output_gain.clamp_value(settings.output_gain),
        low_cut_hz: ranges.low_cut_hz.clamp_value(settings.low_cut_hz),
        high_cut_hz: ranges.high_cut_hz.clamp_value(settings.high_cut_hz),
        ..settings.clone()
    }
}

/// Grain overlap budget: density is capped to `MAX_OVERLAP_MS / grain_size_ms`.
const MAX_OVERLAP_MS: f32 = 16000.0;
/// Grain sizes below this buzz when spawned densely.
const BUZZ_GRAIN_SIZE_MS: f32 = 30.0;
const BUZZ_MAX_DENSITY_HZ: f32 = 30.0;
/// Heavy pitch randomization muddies the low end.
const MUD_PITCH_RANDOM_SEMITONES: f32 = 4.0;
const MUD_MIN_LOW_CUT_HZ: f32 = 150.0;
/// Dense clouds with large amplitude variance pump.
const PUMPING_DENSITY_HZ: f32 = 25.0;
const PUMPING_MAX_AMPLITUDE_VARIANCE: f32 = 0.25;

/// Applies the fixed, ordered set of corrective derivations on top of the given settings.
///
/// In cinematic mode: the grain overlap is capped, the density of short grains is capped,
/// heavy pitch randomization raises the low cut, and high densities cap the amplitude variance.
/// In all modes, the high cut is kept at least one octave above the low cut.
///
/// Rules only lower caps or raise floors, so applying them twice has no further effect.
pub fn apply_anti_mud_rules(settings: &GranularSettings) -> GranularSettings {
    let mut settings = settings.clone();
    if settings.mode == OperatingMode::Cinematic {
        // overlap
        if settings.grain_size_ms > 0.0 {
            let max_density = MAX_OVERLAP_MS / settings.grain_size_ms;
            if settings.density_hz > max_density {
                settings.density_hz = max_density;
            }
        }
        // buzz
        if settings.grain_size_ms < BUZZ_GRAIN_SIZE_MS {
            settings.density_hz = settings.density_hz.min(BUZZ_MAX_DENSITY_HZ);
        }
        // mud
        if settings.pitch_random_semitones > MUD_PITCH_RANDOM_SEMITONES {
            settings.low_cut_hz = settings.low_cut_hz.max(MUD_MIN_LOW_CUT_HZ);
        }
        // pumping
        if settings.density_hz > PUMPING_DENSITY_HZ {
            settings.amplitude_variance = settings
                .amplitude_variance
                .min(PUMPING_MAX_AMPLITUDE_VARIANCE);
        }
    }
    // filter order
    settings.high_cut_hz = settings.high_cut_hz.max(2.0 * settings.low_cut_hz);
    settings
}

/// Commit a settings mutation: clamps all fields into the mode's ranges, then applies the
/// mode's anti-mud rules.
pub fn commit(settings: &GranularSettings) -> GranularSettings {
    apply_anti_mud_rules(&clamp_to_mode(settings))
}

// -------------------------------------------------------------------------------------------------
