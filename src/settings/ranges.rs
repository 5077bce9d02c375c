use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::OperatingMode;

// -------------------------------------------------------------------------------------------------

/// A continuous (float) settings parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// The unique id of the parameter.
    pub fn id(&self) -> FourCC {
        self.id
    }

    /// The name of the parameter.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parameter's unit, if any.
    pub fn unit(&self) -> &'static str {
        self.unit
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Clamp the given plain value to the parameter's range. NaN values resolve to the
    /// parameter's default value.
    pub fn clamp_value(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(*self.range.start(), *self.range.end())
        }
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        let (start, end) = (*self.range.start(), *self.range.end());
        (self.clamp_value(value) - start) / (end - start)
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        let (start, end) = (*self.range.start(), *self.range.end());
        let normalized = if normalized.is_nan() {
            self.normalize_value(self.default)
        } else {
            normalized.clamp(0.0, 1.0)
        };
        start + normalized * (end - start)
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Convert the given string to a clamped plain value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let value = string
            .trim()
            .trim_end_matches(self.unit)
            .trim()
            .parse::<f32>()
            .ok()?;
        Some(self.clamp_value(value))
    }
}

// -------------------------------------------------------------------------------------------------

/// Static range table of all ranged [`GranularSettings`](super::GranularSettings) fields for
/// a single [`OperatingMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRanges {
    pub grain_size_ms: FloatParameter,
    pub density_hz: FloatParameter,
    pub position: FloatParameter,
    pub spray: FloatParameter,
    pub scan_speed: FloatParameter,
    pub pitch_semitones: FloatParameter,
    pub pitch_random_semitones: FloatParameter,
    pub stereo_spread: FloatParameter,
    pub amplitude_variance: FloatParameter,
    pub output_gain: FloatParameter,
    pub low_cut_hz: FloatParameter,
    pub high_cut_hz: FloatParameter,
}

impl ParameterRanges {
    pub const GRAIN_SIZE: FourCC = FourCC(*b"gsiz");
    pub const DENSITY: FourCC = FourCC(*b"gden");
    pub const POSITION: FourCC = FourCC(*b"gpos");
    pub const SPRAY: FourCC = FourCC(*b"gspr");
    pub const SCAN_SPEED: FourCC = FourCC(*b"gscn");
    pub const PITCH: FourCC = FourCC(*b"gpit");
    pub const PITCH_RANDOM: FourCC = FourCC(*b"gprn");
    pub const STEREO_SPREAD: FourCC = FourCC(*b"gste");
    pub const AMPLITUDE_VARIANCE: FourCC = FourCC(*b"gamp");
    pub const OUTPUT_GAIN: FourCC = FourCC(*b"gvol");
    pub const LOW_CUT: FourCC = FourCC(*b"glow");
    pub const HIGH_CUT: FourCC = FourCC(*b"ghig");

    /// All parameter descriptors of the table.
    pub fn parameters(&self) -> [&FloatParameter; 12] {
        [
            &self.grain_size_ms,
            &self.density_hz,
            &self.position,
            &self.spray,
            &self.scan_speed,
            &self.pitch_semitones,
            &self.pitch_random_semitones,
            &self.stereo_spread,
            &self.amplitude_variance,
            &self.output_gain,
            &self.low_cut_hz,
            &self.high_cut_hz,
        ]
    }

    /// Find a parameter descriptor by its id.
    pub fn parameter(&self, id: FourCC) -> Option<&FloatParameter> {
        self.parameters()
            .into_iter()
            .find(|parameter| parameter.id() == id)
    }
}

// -------------------------------------------------------------------------------------------------

/// Guardrailed ranges, biased toward musically safe results.
pub static CINEMATIC_RANGES: ParameterRanges = ParameterRanges {
    grain_size_ms: FloatParameter::new(
        ParameterRanges::GRAIN_SIZE,
        "Grain Size",
        20.0..=500.0,
        80.0,
    )
    .with_unit("ms"),
    density_hz: FloatParameter::new(ParameterRanges::DENSITY, "Density", 1.0..=40.0, 12.0)
        .with_unit("Hz"),
    position: FloatParameter::new(ParameterRanges::POSITION, "Position", 0.0..=1.0, 0.5),
    spray: FloatParameter::new(ParameterRanges::SPRAY, "Spray", 0.0..=0.5, 0.05),
    scan_speed: FloatParameter::new(ParameterRanges::SCAN_SPEED, "Scan Speed", -1.0..=1.0, 0.0),
    pitch_semitones: FloatParameter::new(ParameterRanges::PITCH, "Pitch", -12.0..=12.0, 0.0)
        .with_unit("st"),
    pitch_random_semitones: FloatParameter::new(
        ParameterRanges::PITCH_RANDOM,
        "Pitch Random",
        0.0..=7.0,
        0.0,
    )
    .with_unit("st"),
    stereo_spread: FloatParameter::new(
        ParameterRanges::STEREO_SPREAD,
        "Stereo Spread",
        0.0..=1.0,
        0.5,
    ),
    amplitude_variance: FloatParameter::new(
        ParameterRanges::AMPLITUDE_VARIANCE,
        "Amplitude Variance",
        0.0..=0.5,
        0.1,
    ),
    output_gain: FloatParameter::new(ParameterRanges::OUTPUT_GAIN, "Output Gain", 0.0..=1.5, 0.8),
    low_cut_hz: FloatParameter::new(ParameterRanges::LOW_CUT, "Low Cut", 20.0..=800.0, 20.0)
        .with_unit("Hz"),
    high_cut_hz: FloatParameter::new(
        ParameterRanges::HIGH_CUT,
        "High Cut",
        2000.0..=20000.0,
        20000.0,
    )
    .with_unit("Hz"),
};

/// Full numeric ranges, without guardrails.
pub static DESIGN_RANGES: ParameterRanges = ParameterRanges {
    grain_size_ms: FloatParameter::new(
        ParameterRanges::GRAIN_SIZE,
        "Grain Size",
        1.0..=2000.0,
        80.0,
    )
    .with_unit("ms"),
    density_hz: FloatParameter::new(ParameterRanges::DENSITY, "Density", 0.5..=200.0, 12.0)
        .with_unit("Hz"),
    position: FloatParameter::new(ParameterRanges::POSITION, "Position", 0.0..=1.0, 0.5),
    spray: FloatParameter::new(ParameterRanges::SPRAY, "Spray", 0.0..=1.0, 0.05),
    scan_speed: FloatParameter::new(ParameterRanges::SCAN_SPEED, "Scan Speed", -4.0..=4.0, 0.0),
    pitch_semitones: FloatParameter::new(ParameterRanges::PITCH, "Pitch", -48.0..=48.0, 0.0)
        .with_unit("st"),
    pitch_random_semitones: FloatParameter::new(
        ParameterRanges::PITCH_RANDOM,
        "Pitch Random",
        0.0..=48.0,
        0.0,
    )
    .with_unit("st"),
    stereo_spread: FloatParameter::new(
        ParameterRanges::STEREO_SPREAD,
        "Stereo Spread",
        0.0..=1.0,
        0.5,
    ),
    amplitude_variance: FloatParameter::new(
        ParameterRanges::AMPLITUDE_VARIANCE,
        "Amplitude Variance",
        0.0..=1.0,
        0.1,
    ),
    output_gain: FloatParameter::new(ParameterRanges::OUTPUT_GAIN, "Output Gain", 0.0..=2.0, 0.8),
    low_cut_hz: FloatParameter::new(ParameterRanges::LOW_CUT, "Low Cut", 20.0..=5000.0, 20.0)
        .with_unit("Hz"),
    high_cut_hz: FloatParameter::new(
        ParameterRanges::HIGH_CUT,
        "High Cut",
        200.0..=20000.0,
        20000.0,
    )
    .with_unit("Hz"),
};

/// Get the static range table of the given operating mode.
pub fn get_ranges(mode: OperatingMode) -> &'static ParameterRanges {
    match mode {
        OperatingMode::Cinematic => &CINEMATIC_RANGES,
        OperatingMode::Design => &DESIGN_RANGES,
    }
}

// -------------------------------------------------------------------------------------------------
