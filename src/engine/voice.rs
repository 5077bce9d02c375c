use crate::{
    reader::{read_frame, InterpolationMode},
    GrainWindowMode, SampleBuffer, ScheduledEvent,
};

// -------------------------------------------------------------------------------------------------

/// Runtime state of a single sounding grain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Voice {
    /// Is this voice currently active?
    active: bool,
    /// Total length of the grain in samples.
    duration_samples: u32,
    /// Absolute fractional start index in the sample buffer.
    position: f64,
    /// Number of samples played so far (0..=duration_samples).
    phase: u32,
    /// Playback rate: buffer index increment per rendered sample.
    rate: f64,
    gain_left: f32,
    gain_right: f32,
    window: GrainWindowMode,
    /// Frame offset into the next rendered block at which the voice starts sounding.
    start_offset: usize,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice {
    /// Create a new inactive voice.
    pub const fn new() -> Self {
        Self {
            active: false,
            duration_samples: 0,
            position: 0.0,
            phase: 0,
            rate: 1.0,
            gain_left: 1.0,
            gain_right: 1.0,
            window: GrainWindowMode::Hann,
            start_offset: 0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    #[cfg(test)]
    pub fn duration_samples(&self) -> u32 {
        self.duration_samples
    }

    #[cfg(test)]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Activate this voice for the given event.
    pub fn activate(
        &mut self,
        event: &ScheduledEvent,
        buffer_len: usize,
        start_offset: usize,
        default_window: GrainWindowMode,
    ) {
        let max_index = buffer_len.saturating_sub(1) as f64;
        self.active = event.duration_samples > 0;
        self.duration_samples = event.duration_samples;
        self.position = event.start_position.clamp(0.0, 1.0) as f64 * max_index;
        self.phase = 0;
        self.rate = event.rate as f64;
        self.gain_left = event.gain_left;
        self.gain_right = event.gain_right;
        self.window = event.window.unwrap_or(default_window);
        self.start_offset = start_offset;
    }

    /// Deactivate this voice immediately.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.phase = 0;
        self.start_offset = 0;
    }

    /// Number of samples of the given block this voice will play and the block offset at
    /// which it starts. Consumes the start offset.
    #[inline]
    fn next_block_range(&mut self, block_len: usize) -> (usize, usize) {
        let offset = std::mem::take(&mut self.start_offset).min(block_len);
        let remaining = self.duration_samples.saturating_sub(self.phase) as usize;
        (offset, remaining.min(block_len - offset))
    }

    /// Mix this voice's windowed samples into the given output block, advancing its phase.
    /// Deactivates the voice as soon as its phase reaches its duration.
    pub fn render(
        &mut self,
        buffer: &SampleBuffer,
        interpolation: InterpolationMode,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        debug_assert!(self.active, "Should only render active voices");
        debug_assert_eq!(left.len(), right.len());

        let (offset, frames) = self.next_block_range(left.len());
        let range = offset..offset + frames;

        let duration = self.duration_samples as f32;
        for (l, r) in left[range.clone()].iter_mut().zip(&mut right[range]) {
            let amplitude = self.window.evaluate(self.phase as f32 / duration);
            let index = self.position + self.phase as f64 * self.rate;
            let (sample_left, sample_right) = read_frame(buffer, index, interpolation);
            *l += sample_left * amplitude * self.gain_left;
            *r += sample_right * amplitude * self.gain_right;
            self.phase += 1;
        }

        if self.phase >= self.duration_samples {
            self.active = false;
        }
    }

    /// Advance this voice's phase by a block without producing any output.
    pub fn advance(&mut self, block_len: usize) {
        let (_, frames) = self.next_block_range(block_len);
        self.phase += frames as u32;
        if self.phase >= self.duration_samples {
            self.active = false;
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Fixed capacity set of grain voices.
///
/// All voices are allocated upfront: spawning grains never allocates. When all voices are busy,
/// new grains are dropped. Active voices are never stolen.
pub(crate) struct VoicePool {
    /// Pool of reusable voice instances.
    voices: Box<[Voice]>,
    /// Indices of currently active voices.
    active_voice_indices: Vec<usize>,
}

impl VoicePool {
    /// Create a new voice pool with the given number of voices.
    pub fn new(max_grains: usize) -> Self {
        debug_assert!(max_grains > 0, "Need at least one voice");
        let voices = vec![Voice::new(); max_grains].into_boxed_slice();
        let active_voice_indices = Vec::with_capacity(max_grains);
        Self {
            voices,
            active_voice_indices,
        }
    }

    /// Maximum number of simultaneously active voices.
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Number of currently active voices.
    pub fn active_count(&self) -> usize {
        self.active_voice_indices.len()
    }

    /// Iterate over all currently active voices.
    #[cfg(test)]
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice> {
        self.active_voice_indices
            .iter()
            .map(|&index| &self.voices[index])
            .filter(|voice| voice.is_active())
    }

    /// Start a new voice for the given event in the first free slot.
    /// Returns false, when no voice was free and the event got dropped.
    pub fn allocate(
        &mut self,
        event: &ScheduledEvent,
        buffer_len: usize,
        start_offset: usize,
        default_window: GrainWindowMode,
    ) -> bool {
        if let Some(index) = self.voices.iter().position(|v| !v.is_active()) {
            let voice = &mut self.voices[index];
            voice.activate(event, buffer_len, start_offset, default_window);
            if voice.is_active() {
                self.active_voice_indices.push(index);
            }
            true
        } else {
            false
        }
    }

    /// Render all active voices into the given block and release voices which completed.
    /// Without a buffer, voices advance silently, so they still finish in time.
    pub fn render(
        &mut self,
        buffer: Option<&SampleBuffer>,
        interpolation: InterpolationMode,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        for &voice_index in &self.active_voice_indices {
            let voice = &mut self.voices[voice_index];
            if !voice.is_active() {
                continue;
            }
            match buffer {
                Some(buffer) => voice.render(buffer, interpolation, left, right),
                None => voice.advance(left.len()),
            }
        }

        // Cleanup voices from the list which finished playback
        let voices = &self.voices;
        self.active_voice_indices
            .retain(|&index| voices[index].is_active());
    }

    /// Stop all voices immediately.
    pub fn clear(&mut self) {
        for voice in &mut self.voices {
            voice.deactivate();
        }
        self.active_voice_indices.clear();
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn render_block(
        pool: &mut VoicePool,
        buffer: Option<&SampleBuffer>,
        block_len: usize,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; block_len];
        let mut right = vec![0.0; block_len];
        pool.render(buffer, InterpolationMode::Linear, &mut left, &mut right);
        (left, right)
    }

    #[test]
    fn voice_lifetime() {
        let buffer = SampleBuffer::mono(vec![1.0; 1000]);
        let mut pool = VoicePool::new(4);

        let event = ScheduledEvent::new(0, 100, 0.5);
        assert!(pool.allocate(&event, buffer.len(), 0, GrainWindowMode::Hann));
        assert_eq!(pool.active_count(), 1);
        let voice = pool.active_voices().next().unwrap();
        assert!((voice.position() - 499.5).abs() < 1e-9);
        assert_eq!(voice.phase(), 0);

        let (left, _) = render_block(&mut pool, Some(&buffer), 64);
        assert_eq!(pool.active_voices().next().unwrap().phase(), 64);
        assert!(left.iter().skip(1).all(|v| *v > 0.0));

        // freed in the same block in which it reaches its duration
        let (left, right) = render_block(&mut pool, Some(&buffer), 64);
        assert_eq!(pool.active_count(), 0);
        assert!(left[..36].iter().skip(1).all(|v| *v > 0.0));
        assert!(left[36..].iter().all(|v| *v == 0.0));
        assert!(right[36..].iter().all(|v| *v == 0.0));

        // contributes nothing thereafter
        let (left, right) = render_block(&mut pool, Some(&buffer), 64);
        assert!(left.iter().chain(right.iter()).all(|v| *v == 0.0));
    }

    #[test]
    fn phase_stays_in_range() {
        let buffer = SampleBuffer::mono(vec![0.5; 256]);
        let mut pool = VoicePool::new(8);
        for (index, duration) in [1, 7, 31, 64, 65, 200].into_iter().enumerate() {
            let event = ScheduledEvent::new(0, duration, 0.1 * index as f32);
            assert!(pool.allocate(&event, buffer.len(), index, GrainWindowMode::Gaussian));
        }
        for _ in 0..10 {
            render_block(&mut pool, Some(&buffer), 32);
            for voice in pool.active_voices() {
                assert!(voice.phase() <= voice.duration_samples());
                assert!(voice.phase() < voice.duration_samples(), "not released");
            }
        }
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn start_offset_delays_voice() {
        let buffer = SampleBuffer::mono(vec![1.0; 100]);
        let mut pool = VoicePool::new(1);
        let event = ScheduledEvent::new(0, 8, 0.0).with_window(GrainWindowMode::Rectangular);
        assert!(pool.allocate(&event, buffer.len(), 10, GrainWindowMode::Hann));

        let (left, right) = render_block(&mut pool, Some(&buffer), 32);
        assert!(left[..10].iter().all(|v| *v == 0.0));
        assert!(left[10..18].iter().all(|v| *v == 1.0));
        assert!(right[10..18].iter().all(|v| *v == 1.0));
        assert!(left[18..].iter().all(|v| *v == 0.0));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn exhausted_pool_drops_grains() {
        let buffer = SampleBuffer::mono(vec![1.0; 100]);
        let mut pool = VoicePool::new(4);
        let event = ScheduledEvent::new(0, 50, 0.0);
        let allocated = (0..6)
            .filter(|_| pool.allocate(&event, buffer.len(), 0, GrainWindowMode::Hann))
            .count();
        assert_eq!(allocated, 4);
        assert_eq!(pool.active_count(), pool.capacity());

        // slots get reused once voices finished
        render_block(&mut pool, Some(&buffer), 64);
        assert_eq!(pool.active_count(), 0);
        assert!(pool.allocate(&event, buffer.len(), 0, GrainWindowMode::Hann));
    }

    #[test]
    fn voices_advance_without_buffer() {
        let mut pool = VoicePool::new(2);
        let event = ScheduledEvent::new(0, 100, 0.5);
        assert!(pool.allocate(&event, 0, 0, GrainWindowMode::Hann));
        let (left, right) = render_block(&mut pool, None, 64);
        assert!(left.iter().chain(right.iter()).all(|v| *v == 0.0));
        assert_eq!(pool.active_voices().next().unwrap().phase(), 64);
        render_block(&mut pool, None, 64);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn stereo_gains_and_window() {
        let buffer = SampleBuffer::stereo(vec![1.0; 64], vec![-1.0; 64]).unwrap();
        let mut pool = VoicePool::new(1);
        let event = ScheduledEvent::new(0, 4, 0.0)
            .with_gain(0.5, 0.25)
            .with_window(GrainWindowMode::Hann);
        assert!(pool.allocate(&event, buffer.len(), 0, GrainWindowMode::Rectangular));
        let (left, right) = render_block(&mut pool, Some(&buffer), 4);
        // hann at phases 0, 1/4, 2/4, 3/4
        let expected = [0.0, 0.5, 1.0, 0.5];
        for i in 0..4 {
            assert!((left[i] - expected[i] * 0.5).abs() < 1e-5);
            assert!((right[i] + expected[i] * 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn clear_stops_all_voices() {
        let mut pool = VoicePool::new(3);
        for _ in 0..3 {
            pool.allocate(
                &ScheduledEvent::new(0, 1000, 0.0),
                10,
                0,
                GrainWindowMode::Hann,
            );
        }
        assert_eq!(pool.active_count(), 3);
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.active_voices().count(), 0);
    }
}
