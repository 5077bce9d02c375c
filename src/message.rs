//! Messages exchanged between the control side and the render side of the engine.

use std::{
    sync::atomic::{AtomicU8, Ordering},
    time::Duration,
};

use basedrop::Owned;

use crate::{utils::time::SampleTime, GrainWindowMode, SampleBuffer, ScheduledEvent};

// -------------------------------------------------------------------------------------------------

/// Messages from the control side to the [GrainEngine](crate::GrainEngine).
///
/// Heap allocated payloads are wrapped into [`Owned`], so they get deallocated on the control
/// side's collector and never in the audio thread.
pub enum EngineMessage {
    /// Replace the sample buffer wholesale.
    SetBuffer(Owned<SampleBuffer>),
    /// Append a batch of grain spawn events to the event queue.
    Schedule(Owned<Vec<ScheduledEvent>>),
    /// Enable periodic clock telemetry with the given interval.
    ClockStart { interval: Duration },
    /// Disable clock telemetry.
    ClockStop,
    /// Set the window of grains which don't specify their own.
    SetWindowType(GrainWindowMode),
    /// Drop all pending events and active voices. Keeps the sample clock running.
    Clear,
    /// Drop all pending events and active voices and reset the sample clock and telemetry.
    Reset,
}

impl std::fmt::Debug for EngineMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetBuffer(buffer) => f
                .debug_struct("SetBuffer")
                .field("len", &buffer.len())
                .field("channel_count", &buffer.channel_count())
                .finish(),
            Self::Schedule(events) => f
                .debug_struct("Schedule")
                .field("events", &events.len())
                .finish(),
            Self::ClockStart { interval } => f
                .debug_struct("ClockStart")
                .field("interval", interval)
                .finish(),
            Self::ClockStop => write!(f, "ClockStop"),
            Self::SetWindowType(window) => f.debug_tuple("SetWindowType").field(window).finish(),
            Self::Clear => write!(f, "Clear"),
            Self::Reset => write!(f, "Reset"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Events sent from the [GrainEngine](crate::GrainEngine) back to the control side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A new sample buffer got loaded.
    BufferInfo { length: usize },
    /// Periodic clock telemetry: the engine's absolute sample position after the last block.
    Clock { position: SampleTime },
}

// -------------------------------------------------------------------------------------------------

/// A `clear` or `reset` request which did not fit into the full message queue.
///
/// While a request is pending, the handle queues no other messages. The engine thus applies it
/// after all messages which got queued before it, at the start of its next render call.
#[derive(Debug, Default)]
pub(crate) struct CancelRequest(AtomicU8);

impl CancelRequest {
    pub const NONE: u8 = 0;
    pub const CLEAR: u8 = 1;
    /// A reset includes a clear, so it replaces pending clear requests.
    pub const RESET: u8 = 2;

    pub fn is_pending(&self) -> bool {
        self.load() != Self::NONE
    }

    pub fn load(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    pub fn request(&self, request: u8) {
        self.0.fetch_max(request, Ordering::AcqRel);
    }

    /// Mark the given request as applied, unless it got replaced by a reset meanwhile.
    pub fn acknowledge(&self, applied: u8) {
        let _ = self
            .0
            .compare_exchange(applied, Self::NONE, Ordering::AcqRel, Ordering::Acquire);
    }
}

// -------------------------------------------------------------------------------------------------
