//! The render side of the granular synthesis engine.

use std::{sync::Arc, time::Duration};

use basedrop::Owned;
use crossbeam_channel::{Sender, TrySendError};
use crossbeam_queue::ArrayQueue;

use crate::{
    message::{CancelRequest, EngineEvent, EngineMessage},
    reader::InterpolationMode,
    utils::{
        buffer::clear_buffer,
        time::{duration_to_sample_time, SampleTime},
    },
    Error, GrainEngineHandle, GrainWindowMode, SampleBuffer,
};

// -------------------------------------------------------------------------------------------------

pub mod event;
mod queue;
mod voice;

use queue::EventQueue;
use voice::VoicePool;

// -------------------------------------------------------------------------------------------------

/// Options to create a new [`GrainEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// By default 48000. The output sample rate, used to convert telemetry intervals.
    pub sample_rate: u32,

    /// By default 64. Maximum number of simultaneously sounding grains. Grains which get
    /// spawned while all voices are busy are dropped.
    pub max_grains: usize,

    /// By default [`InterpolationMode::Linear`]. Sample interpolation of all grains.
    pub interpolation: InterpolationMode,

    /// By default [`GrainWindowMode::Hann`]. Window of grains which don't specify their own.
    pub window: GrainWindowMode,

    /// By default 1024. Size of the control message queue. Sending messages to a full queue fails.
    pub message_queue_size: usize,

    /// By default 4096. Preallocated number of pending grain events. Scheduling more events
    /// than this in advance allocates in the audio thread.
    pub event_queue_capacity: usize,

    /// By default 64. Size of the engine event (buffer info and clock) channel.
    pub event_channel_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            max_grains: 64,
            interpolation: InterpolationMode::Linear,
            window: GrainWindowMode::Hann,
            message_queue_size: 1024,
            event_queue_capacity: 4096,
            event_channel_size: 64,
        }
    }
}

impl EngineOptions {
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn max_grains(mut self, max_grains: usize) -> Self {
        self.max_grains = max_grains;
        self
    }

    pub fn interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn window(mut self, window: GrainWindowMode) -> Self {
        self.window = window;
        self
    }

    pub fn message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    pub fn event_channel_size(mut self, size: usize) -> Self {
        self.event_channel_size = size;
        self
    }

    /// Validate all options. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(
                "engine options 'sample_rate' must be > 0".to_string(),
            ));
        }
        if self.max_grains == 0 {
            return Err(Error::ParameterError(
                "engine options 'max_grains' must be > 0".to_string(),
            ));
        }
        if self.message_queue_size == 0 || self.event_channel_size == 0 {
            return Err(Error::ParameterError(format!(
                "engine options queue sizes must be > 0, but are '{}' and '{}'",
                self.message_queue_size, self.event_channel_size
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Periodic clock position reporting.
#[derive(Debug, Default, Clone, Copy)]
struct ClockTelemetry {
    /// Report interval in samples. None when disabled.
    interval: Option<SampleTime>,
    /// Samples rendered since the last report.
    elapsed: SampleTime,
}

impl ClockTelemetry {
    fn start(&mut self, interval: SampleTime) {
        self.interval = Some(interval.max(1));
        self.elapsed = 0;
    }

    fn stop(&mut self) {
        self.interval = None;
    }

    fn reset(&mut self) {
        self.elapsed = 0;
    }

    /// Accumulate rendered samples. Returns true when a report is due. The overshoot is
    /// carried over, so reports keep the interval's period on average.
    fn advance(&mut self, samples: SampleTime) -> bool {
        if let Some(interval) = self.interval {
            self.elapsed += samples;
            if self.elapsed >= interval {
                self.elapsed %= interval;
                return true;
            }
        }
        false
    }
}

// -------------------------------------------------------------------------------------------------

/// Real-time granular synthesis engine.
///
/// The engine is owned by the audio thread and gets invoked once per audio block via
/// [`render`](Self::render). It is controlled exclusively via messages, sent from a
/// [`GrainEngineHandle`]. Messages are applied at the start of the next render call.
///
/// Per block, the engine activates all due grain events from its event queue in a fixed size
/// voice pool, mixes all active voices into the output and advances its absolute sample clock
/// by the block length. Rendering never allocates (as long as the event queue's capacity is
/// not exceeded), never blocks and never fails: missing buffers render silence, grains which
/// find no free voice are dropped and overdue grains start immediately.
pub struct GrainEngine {
    message_queue: Arc<ArrayQueue<EngineMessage>>,
    cancel_request: Arc<CancelRequest>,
    event_sender: Sender<EngineEvent>,
    buffer: Option<Owned<SampleBuffer>>,
    voices: VoicePool,
    events: EventQueue,
    clock: SampleTime,
    window: GrainWindowMode,
    interpolation: InterpolationMode,
    sample_rate: u32,
    telemetry: ClockTelemetry,
    dropped_grains: u64,
}

impl GrainEngine {
    /// Smallest accepted clock telemetry interval.
    pub const MIN_CLOCK_INTERVAL: Duration = Duration::from_millis(10);

    /// Create a new engine and the handle to control it.
    pub fn new(options: EngineOptions) -> Result<(Self, GrainEngineHandle), Error> {
        options.validate()?;

        let message_queue = Arc::new(ArrayQueue::new(options.message_queue_size));
        let cancel_request = Arc::new(CancelRequest::default());
        let (event_sender, event_receiver) = crossbeam_channel::bounded(options.event_channel_size);

        let engine = Self {
            message_queue: Arc::clone(&message_queue),
            cancel_request: Arc::clone(&cancel_request),
            event_sender,
            buffer: None,
            voices: VoicePool::new(options.max_grains),
            events: EventQueue::with_capacity(options.event_queue_capacity),
            clock: 0,
            window: options.window,
            interpolation: options.interpolation,
            sample_rate: options.sample_rate,
            telemetry: ClockTelemetry::default(),
            dropped_grains: 0,
        };
        let handle = GrainEngineHandle::new(message_queue, cancel_request, event_receiver);

        log::debug!(
            "Created grain engine with {} voices at {} Hz",
            options.max_grains,
            options.sample_rate
        );
        Ok((engine, handle))
    }

    /// Absolute sample position: the number of samples rendered since creation or the
    /// last reset.
    pub fn clock(&self) -> SampleTime {
        self.clock
    }

    /// The engine's output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Window of grains which don't specify their own.
    pub fn window(&self) -> GrainWindowMode {
        self.window
    }

    /// Maximum number of simultaneously sounding grains.
    pub fn max_grains(&self) -> usize {
        self.voices.capacity()
    }

    /// Number of currently sounding grains.
    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    /// Number of scheduled, not yet activated grain events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Number of grains which were dropped because no voice was free.
    pub fn dropped_grains(&self) -> u64 {
        self.dropped_grains
    }

    /// Length of the loaded sample buffer in frames, or 0 when no buffer is loaded.
    pub fn buffer_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buffer| buffer.len())
    }

    /// Render the next block of audio into the given planar output channels.
    ///
    /// The block length is the length of the channel slices, which should be equal. Both
    /// channels are always fully overwritten.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len(), "Channel lengths should match");
        let block_len = left.len().min(right.len());
        clear_buffer(&mut left[block_len..]);
        clear_buffer(&mut right[block_len..]);
        let (left, right) = (&mut left[..block_len], &mut right[..block_len]);

        // apply pending control messages
        self.process_messages();

        // activate due events
        let block_start = self.clock;
        let block_end = block_start + block_len as SampleTime;
        self.activate_due_events(block_start, block_end);

        // render active voices
        clear_buffer(left);
        clear_buffer(right);
        let buffer = self.buffer.as_deref().filter(|buffer| buffer.len() >= 2);
        self.voices
            .render(buffer, self.interpolation, left, right);

        // advance clock
        self.clock = block_end;
        if self.telemetry.advance(block_len as SampleTime) {
            self.send_event(EngineEvent::Clock {
                position: self.clock,
            });
        }
    }

    fn activate_due_events(&mut self, block_start: SampleTime, block_end: SampleTime) {
        let buffer_len = self.buffer_len();
        let window = self.window;
        let voices = &mut self.voices;
        let dropped_grains = &mut self.dropped_grains;
        self.events.drain_due(block_end, |event| {
            // overdue events start right away instead of getting skipped
            let start_offset = event.start_sample.saturating_sub(block_start) as usize;
            if !voices.allocate(event, buffer_len, start_offset, window) {
                *dropped_grains += 1;
            }
        });
    }

    fn process_messages(&mut self) {
        // a pending request follows all messages which are queued right now
        let cancel_request = self.cancel_request.load();
        while let Some(message) = self.message_queue.pop() {
            match message {
                EngineMessage::SetBuffer(buffer) => {
                    let length = buffer.len();
                    // the replaced buffer gets released by the collector
                    self.buffer = Some(buffer);
                    self.send_event(EngineEvent::BufferInfo { length });
                }
                EngineMessage::Schedule(events) => {
                    self.events.enqueue(&events);
                }
                EngineMessage::ClockStart { interval } => {
                    let interval = interval.max(Self::MIN_CLOCK_INTERVAL);
                    self.telemetry
                        .start(duration_to_sample_time(interval, self.sample_rate));
                }
                EngineMessage::ClockStop => {
                    self.telemetry.stop();
                }
                EngineMessage::SetWindowType(window) => {
                    self.window = window;
                }
                EngineMessage::Clear => {
                    self.clear();
                }
                EngineMessage::Reset => {
                    self.reset();
                }
            }
        }
        match cancel_request {
            CancelRequest::NONE => return,
            CancelRequest::CLEAR => self.clear(),
            _ => self.reset(),
        }
        self.cancel_request.acknowledge(cancel_request);
    }

    /// Drop all pending events and active voices. Keeps the sample clock.
    fn clear(&mut self) {
        self.events.clear();
        self.voices.clear();
    }

    /// Drop all pending events and active voices and reset the sample clock and telemetry.
    fn reset(&mut self) {
        self.clear();
        self.clock = 0;
        self.telemetry.reset();
    }

    fn send_event(&self, event: EngineEvent) {
        // NB: try_send: we want to ignore full channels and don't want to block
        match self.event_sender.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("Failed to send engine event {event:?}: channel is full");
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
