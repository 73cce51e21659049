//! Model sink interface and fixed-size event batching.

use super::events::{EventPayload, ModelEvent, ThreadRef};
use log::debug;
use std::collections::BTreeMap;

/// Receiver of emitted model events
///
/// A batch is applied as one unit, in order.
pub trait ModelSink {
    fn apply(&mut self, batch: Vec<ModelEvent>);
}

/// Buffers events and hands them to a sink `batch_size` at a time
#[derive(Debug)]
pub struct EventBatcher {
    buffer: Vec<ModelEvent>,
    batch_size: usize,
    next_number: u64,
    batches: u64,
}

impl EventBatcher {
    /// A zero batch size is treated as one.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            next_number: 1,
            batches: 0,
        }
    }

    /// Number the event, buffer it, and deliver a full batch if ready
    pub fn push<S: ModelSink + ?Sized>(
        &mut self,
        timestamp: i64,
        thread: ThreadRef,
        line: Option<u32>,
        payload: EventPayload,
        sink: &mut S,
    ) {
        self.buffer.push(ModelEvent {
            number: self.next_number,
            timestamp,
            thread,
            line,
            payload,
        });
        self.next_number += 1;

        if self.buffer.len() >= self.batch_size {
            self.flush(sink);
        }
    }

    /// Deliver whatever is buffered (a partial batch at end of stream)
    pub fn flush<S: ModelSink + ?Sized>(&mut self, sink: &mut S) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        debug!("Delivering batch {} ({} events)", self.batches + 1, batch.len());
        sink.apply(batch);
        self.batches += 1;
    }

    /// Events numbered so far, delivered or not
    pub fn emitted(&self) -> u64 {
        self.next_number - 1
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// In-memory execution model: keeps every delivered event in order
#[derive(Debug, Default)]
pub struct ExecutionModel {
    events: Vec<ModelEvent>,
    batch_sizes: Vec<usize>,
}

impl ExecutionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ModelEvent> {
        self.events
    }

    /// Size of each applied batch, in delivery order
    pub fn batch_sizes(&self) -> &[usize] {
        &self.batch_sizes
    }

    /// Event counts by kind name
    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, u64> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.payload.kind_name()).or_insert(0) += 1;
        }
        counts
    }
}

impl ModelSink for ExecutionModel {
    fn apply(&mut self, batch: Vec<ModelEvent>) {
        self.batch_sizes.push(batch.len());
        self.events.extend(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_system_events(batcher: &mut EventBatcher, sink: &mut ExecutionModel, count: usize) {
        for ts in 0..count {
            batcher.push(ts as i64, ThreadRef::System, None, EventPayload::SystemStart, sink);
        }
    }

    #[test]
    fn test_full_batches_then_partial_flush() {
        let mut sink = ExecutionModel::new();
        let mut batcher = EventBatcher::new(3);

        push_system_events(&mut batcher, &mut sink, 7);
        assert_eq!(sink.batch_sizes(), &[3, 3]);
        assert_eq!(batcher.pending(), 1);

        batcher.flush(&mut sink);
        assert_eq!(sink.batch_sizes(), &[3, 3, 1]);
        assert_eq!(batcher.emitted(), 7);
        assert_eq!(batcher.batches(), 3);

        let numbers: Vec<u64> = sink.events().iter().map(|e| e.number).collect();
        assert_eq!(numbers, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut sink = ExecutionModel::new();
        let mut batcher = EventBatcher::new(100);
        batcher.flush(&mut sink);
        assert!(sink.batch_sizes().is_empty());
    }
}
