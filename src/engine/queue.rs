use crate::{utils::time::SampleTime, ScheduledEvent};

// -------------------------------------------------------------------------------------------------

/// Ordered queue of pending grain spawn events.
///
/// Events are appended to a vector and consumed by advancing a head offset. Consumed events
/// are physically removed once the head passes [EventQueue::COMPACTION_THRESHOLD], so the
/// storage does not grow without bounds.
///
/// Note: Enqueuing never allocates as long as the live events fit into the queue's initial
/// capacity.
pub(crate) struct EventQueue {
    events: Vec<ScheduledEvent>,
    head: usize,
}

impl EventQueue {
    /// Number of consumed head entries after which the queue gets compacted.
    pub const COMPACTION_THRESHOLD: usize = 1024;

    /// Create a new, empty queue with the given preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Number of pending (not yet activated) events.
    pub fn len(&self) -> usize {
        self.events.len() - self.head
    }

    /// True when there are no pending events.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the underlying storage, including consumed but not yet compacted events.
    #[cfg(test)]
    pub fn storage_len(&self) -> usize {
        self.events.len()
    }

    /// Allocated capacity of the underlying storage.
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    /// Pending events in activation order.
    #[cfg(test)]
    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.events[self.head..]
    }

    /// Merge a batch of events, sorted by start time, into the pending events.
    ///
    /// The merge runs in place, in at most `len() + batch.len()` steps. Pending events stay in
    /// front of batch events with the same start time.
    pub fn enqueue(&mut self, batch: &[ScheduledEvent]) {
        debug_assert!(
            batch
                .windows(2)
                .all(|pair| pair[0].start_sample <= pair[1].start_sample),
            "Batches should be sorted by start time"
        );
        if batch.is_empty() {
            return;
        }
        let pending_len = self.len();
        self.events.extend_from_slice(batch);
        Self::merge_from_back(&mut self.events[self.head..], pending_len, batch);
    }

    /// Activate all pending events which are due before `block_end`, in order.
    ///
    /// Overdue events, which should have started before the current block, are activated too:
    /// the caller decides how to start them. Each event gets passed exactly once.
    pub fn drain_due<F>(&mut self, block_end: SampleTime, mut activate: F)
    where
        F: FnMut(&ScheduledEvent),
    {
        while let Some(event) = self.events.get(self.head) {
            if event.start_sample >= block_end {
                break;
            }
            activate(event);
            self.head += 1;
        }
        if self.head > Self::COMPACTION_THRESHOLD {
            self.compact();
        }
    }

    /// Drop all pending events.
    pub fn clear(&mut self) {
        self.events.clear();
        self.head = 0;
    }

    /// Remove consumed events from the storage, in place.
    fn compact(&mut self) {
        self.events.drain(..self.head);
        self.head = 0;
    }

    /// Backward merge of the sorted `batch` into `events`. The first `pending_len` entries of
    /// `events` are the sorted pending events, the remaining `batch.len()` entries get
    /// overwritten. Stops as soon as the batch is placed. Returns the number of written entries.
    fn merge_from_back(
        events: &mut [ScheduledEvent],
        pending_len: usize,
        batch: &[ScheduledEvent],
    ) -> usize {
        debug_assert_eq!(events.len(), pending_len + batch.len());
        let mut pending = pending_len;
        let mut remaining = batch.len();
        let mut written = 0;
        while remaining > 0 {
            let target = pending + remaining - 1;
            if pending > 0 && events[pending - 1].start_sample > batch[remaining - 1].start_sample
            {
                events[target] = events[pending - 1];
                pending -= 1;
            } else {
                events[target] = batch[remaining - 1];
                remaining -= 1;
            }
            written += 1;
        }
        written
    }
}

// -------------------------------------------------------------------------------------------------
