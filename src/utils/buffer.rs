// -------------------------------------------------------------------------------------------------

/// Clear the given buffer by filling it with zeros.
#[inline]
pub fn clear_buffer(buffer: &mut [f32]) {
    buffer.fill(0.0);
}

// -------------------------------------------------------------------------------------------------

/// Copy a single channel out of the given interleaved buffer into a new planar buffer.
/// A trailing, incomplete frame in the interleaved buffer is ignored.
pub fn interleaved_to_planar_channel(
    interleaved: &[f32],
    channel_count: usize,
    channel_index: usize,
) -> Vec<f32> {
    debug_assert!(channel_index < channel_count, "Invalid channel index");
    match channel_count {
        1 => interleaved.to_vec(),
        _ => interleaved
            .chunks_exact(channel_count)
            .map(|frame| frame[channel_index])
            .collect(),
    }
}

// -------------------------------------------------------------------------------------------------
