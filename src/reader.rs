//! Interpolated sample lookup at fractional positions.

use assume::assume;

use crate::SampleBuffer;

// -------------------------------------------------------------------------------------------------

/// Sample interpolation mode of the grain engine.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum InterpolationMode {
    /// Two point linear interpolation. Cheap, slightly dull on pitched up grains.
    #[default]
    Linear,
    /// Four point Catmull-Rom interpolation.
    ///
    /// Near the buffer edges, where not all four neighbors exist, the interpolation window is
    /// moved inwards to the nearest valid neighborhood. This slightly alters grains which start
    /// within one sample of the buffer's start or two samples of its end.
    Cubic,
}

// -------------------------------------------------------------------------------------------------

/// Read a linear interpolated sample at the given fractional index.
///
/// The index is clamped to the buffer, so reading never goes out of bounds.
/// Buffers with less than two samples read as silence.
#[inline]
pub fn read_linear(samples: &[f32], index: f64) -> f32 {
    let len = samples.len();
    if len < 2 {
        return 0.0;
    }
    let max_index = (len - 1) as f64;
    let position = if index.is_nan() {
        0.0
    } else {
        index.clamp(0.0, max_index)
    };

    let i0 = (position as usize).min(len - 2);
    let fraction = (position - i0 as f64) as f32;

    assume!(unsafe: i0 + 1 < len);
    let y0 = samples[i0];
    let y1 = samples[i0 + 1];

    y0 + (y1 - y0) * fraction
}

/// Read a cubic (Catmull-Rom) interpolated sample at the given fractional index.
///
/// The base index is clamped to `1..=len-3`, so all four taps are valid. The fraction is
/// taken from the unclamped index, so near the edges the nearest valid neighborhood gets
/// substituted. Buffers with less than four samples fall back to linear interpolation.
#[inline]
pub fn read_cubic(samples: &[f32], index: f64) -> f32 {
    let len = samples.len();
    if len < 4 {
        return read_linear(samples, index);
    }
    let max_index = (len - 1) as f64;
    let position = if index.is_nan() {
        0.0
    } else {
        index.clamp(0.0, max_index)
    };

    let floor = position.floor();
    let fraction = (position - floor).clamp(0.0, 1.0) as f32;
    let i1 = (floor as usize).clamp(1, len - 3);

    assume!(unsafe: i1 >= 1 && i1 + 2 < len);
    let y0 = samples[i1 - 1];
    let y1 = samples[i1];
    let y2 = samples[i1 + 1];
    let y3 = samples[i1 + 2];

    let a = -0.5 * y0 + 1.5 * y1 - 1.5 * y2 + 0.5 * y3;
    let b = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c = -0.5 * y0 + 0.5 * y2;
    let d = y1;

    ((a * fraction + b) * fraction + c) * fraction + d
}

/// Read a single sample from the given channel with the given interpolation mode.
#[inline]
pub fn read_sample(samples: &[f32], index: f64, mode: InterpolationMode) -> f32 {
    match mode {
        InterpolationMode::Linear => read_linear(samples, index),
        InterpolationMode::Cubic => read_cubic(samples, index),
    }
}

/// Read a stereo frame at the given fractional index.
///
/// Both channels are read at the same index. Mono buffers feed both output channels.
#[inline]
pub fn read_frame(buffer: &SampleBuffer, index: f64, mode: InterpolationMode) -> (f32, f32) {
    let left = read_sample(buffer.left(), index, mode);
    if buffer.channel_count() == 1 {
        (left, left)
    } else {
        (left, read_sample(buffer.right(), index, mode))
    }
}

// -------------------------------------------------------------------------------------------------
