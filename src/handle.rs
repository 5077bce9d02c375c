//! Control side handle of a [GrainEngine](crate::GrainEngine).

use std::{str::FromStr, sync::Arc, time::Duration};

use basedrop::{Collector, Owned};
use crossbeam_channel::Receiver;
use crossbeam_queue::ArrayQueue;
use strum::VariantNames;

use crate::{
    message::{CancelRequest, EngineEvent, EngineMessage},
    Error, GrainWindowMode, SampleBuffer, ScheduledEvent,
};

// -------------------------------------------------------------------------------------------------

/// A handle to control a [GrainEngine](crate::GrainEngine) from the control thread.
///
/// All messages are delivered asynchronously via a lock-free queue and get applied by the
/// engine at the start of its next render call. Engine events, such as buffer load
/// acknowledgements and clock ticks, are received via [`try_recv_event`](Self::try_recv_event).
///
/// Sample buffers and event batches get moved to the engine. Once the engine no longer uses
/// them, they are released by the handle's garbage collector on the control thread. Garbage
/// is collected with every handle call and via [`collect_garbage`](Self::collect_garbage).
pub struct GrainEngineHandle {
    message_queue: Arc<ArrayQueue<EngineMessage>>,
    cancel_request: Arc<CancelRequest>,
    event_receiver: Receiver<EngineEvent>,
    collector: Collector,
}

impl GrainEngineHandle {
    pub(crate) fn new(
        message_queue: Arc<ArrayQueue<EngineMessage>>,
        cancel_request: Arc<CancelRequest>,
        event_receiver: Receiver<EngineEvent>,
    ) -> Self {
        let collector = Collector::new();
        Self {
            message_queue,
            cancel_request,
            event_receiver,
            collector,
        }
    }

    /// Replace the engine's sample buffer. The buffer gets moved to the engine.
    pub fn set_buffer(&mut self, buffer: SampleBuffer) -> Result<(), Error> {
        self.collect_garbage();
        log::debug!(
            "Sending sample buffer with {} frames and {} channels",
            buffer.len(),
            buffer.channel_count()
        );
        let buffer = Owned::new(&self.collector.handle(), buffer);
        self.send(EngineMessage::SetBuffer(buffer), "set_buffer")
    }

    /// Schedule a batch of grain events.
    ///
    /// All events get validated first: when any event is invalid, the whole batch is
    /// rejected. Events may be passed in any order: they get sorted here, so the engine only
    /// needs to merge them.
    pub fn schedule(&mut self, mut events: Vec<ScheduledEvent>) -> Result<(), Error> {
        self.collect_garbage();
        if events.is_empty() {
            return Ok(());
        }
        for event in &events {
            event.validate()?;
        }
        events.sort_by_key(|event| event.start_sample);
        let events = Owned::new(&self.collector.handle(), events);
        self.send(EngineMessage::Schedule(events), "schedule")
    }

    /// Enable periodic clock telemetry. Intervals below
    /// [GrainEngine::MIN_CLOCK_INTERVAL](crate::GrainEngine::MIN_CLOCK_INTERVAL) get clamped.
    ///
    /// Ticks are sent after the render call which crossed the next interval boundary, so single
    /// ticks are late by up to one block, but don't drift.
    pub fn clock_start(&mut self, interval: Duration) -> Result<(), Error> {
        self.collect_garbage();
        self.send(EngineMessage::ClockStart { interval }, "clock_start")
    }

    /// Disable clock telemetry.
    pub fn clock_stop(&mut self) -> Result<(), Error> {
        self.collect_garbage();
        self.send(EngineMessage::ClockStop, "clock_stop")
    }

    /// Set the default window by its name, e.g. "hann" or "gaussian".
    pub fn set_window_type(&mut self, name: &str) -> Result<(), Error> {
        let window = GrainWindowMode::from_str(name.trim()).map_err(|_| {
            Error::ParameterError(format!(
                "unknown window type '{name}', expected one of {:?}",
                GrainWindowMode::VARIANTS
            ))
        })?;
        self.set_window(window)
    }

    /// Set the window of grains which don't specify their own window.
    pub fn set_window(&mut self, window: GrainWindowMode) -> Result<(), Error> {
        self.collect_garbage();
        self.send(EngineMessage::SetWindowType(window), "set_window")
    }

    /// Drop all pending events and active voices. The engine's clock keeps running.
    ///
    /// Never fails and never drops other messages: when the message queue is full, the
    /// request is passed to the engine via a flag and other messages get rejected until the
    /// engine applied it.
    pub fn clear(&mut self) {
        self.collect_garbage();
        self.send_cancel(EngineMessage::Clear, CancelRequest::CLEAR);
    }

    /// Drop all pending events and active voices and reset the engine's clock and telemetry.
    ///
    /// Never fails and never drops other messages, just like [`clear`](Self::clear).
    pub fn reset(&mut self) {
        self.collect_garbage();
        self.send_cancel(EngineMessage::Reset, CancelRequest::RESET);
    }

    /// Receive the next pending engine event, if any.
    pub fn try_recv_event(&self) -> Option<EngineEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Access to the engine event receiver, e.g. to wait for events.
    pub fn event_receiver(&self) -> &Receiver<EngineEvent> {
        &self.event_receiver
    }

    /// Release sample buffers and event batches which the engine no longer uses.
    pub fn collect_garbage(&mut self) {
        self.collector.collect();
    }

    fn send(&self, message: EngineMessage, name: &str) -> Result<(), Error> {
        // nothing may overtake a pending clear or reset
        if self.cancel_request.is_pending() {
            log::warn!("Grain engine's message queue is blocked by a pending clear or reset.");
            return Err(Error::SendError(format!(
                "{name}: message queue is full, waiting for a pending clear or reset"
            )));
        }
        self.message_queue.push(message).map_err(|_| {
            log::warn!("Grain engine's message queue is full.");
            log::warn!("Increase the message queue size to prevent this from happening...");
            Error::SendError(format!("{name}: message queue is full"))
        })
    }

    fn send_cancel(&self, message: EngineMessage, request: u8) {
        if self.cancel_request.is_pending() {
            self.cancel_request.request(request);
        } else if let Err(message) = self.message_queue.push(message) {
            log::debug!("Grain engine's message queue is full: passing {message:?} via flag");
            self.cancel_request.request(request);
        }
    }
}

// -------------------------------------------------------------------------------------------------
