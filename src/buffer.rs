//! Immutable sample buffers, played back by the grain engine.

use crate::{utils::buffer::interleaved_to_planar_channel, Error};

// -------------------------------------------------------------------------------------------------

/// A mono or stereo buffer of 32-bit float samples.
///
/// Sample buffers are immutable: the engine replaces them wholesale and never mutates them.
/// Buffers are moved into the engine via [GrainEngineHandle::set_buffer](crate::GrainEngineHandle::set_buffer),
/// so the control side does not keep a usable reference after the transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    left: Box<[f32]>,
    right: Option<Box<[f32]>>,
}

impl SampleBuffer {
    /// Create a new mono sample buffer.
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            left: samples.into_boxed_slice(),
            right: None,
        }
    }

    /// Create a new stereo sample buffer from the given planar channels.
    /// Both channels must have the same length.
    pub fn stereo(left: Vec<f32>, right: Vec<f32>) -> Result<Self, Error> {
        if left.len() != right.len() {
            return Err(Error::ParameterError(format!(
                "stereo channel lengths differ: left has {} and right {} samples",
                left.len(),
                right.len()
            )));
        }
        Ok(Self {
            left: left.into_boxed_slice(),
            right: Some(right.into_boxed_slice()),
        })
    }

    /// Create a new sample buffer from an interleaved buffer with the given channel count.
    /// Only the first two channels are used when there are more than two.
    pub fn from_interleaved(interleaved: &[f32], channel_count: usize) -> Result<Self, Error> {
        match channel_count {
            0 => Err(Error::ParameterError(
                "sample buffer channel count must be > 0".to_string(),
            )),
            1 => Ok(Self::mono(interleaved.to_vec())),
            _ => {
                if channel_count > 2 {
                    log::warn!(
                        "Sample buffer has {channel_count} channels: only the first two will be played"
                    );
                }
                let left = interleaved_to_planar_channel(interleaved, channel_count, 0);
                let right = interleaved_to_planar_channel(interleaved, channel_count, 1);
                Self::stereo(left, right)
            }
        }
    }

    /// Number of sample frames in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True if the buffer contains no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Number of channels (1 or 2).
    #[inline]
    pub fn channel_count(&self) -> usize {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    /// Left (or the only mono) channel's samples.
    #[inline]
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel's samples. For mono buffers this is the mono channel.
    #[inline]
    pub fn right(&self) -> &[f32] {
        self.right.as_deref().unwrap_or(&self.left)
    }
}

// -------------------------------------------------------------------------------------------------
