use {
    fnv::FnvHashMap,
    syncval_core::{EventId, QueueId, Tag},
};

/// Last signal operation of each event.
#[derive(Clone, Debug, Default)]
pub struct Events {
    signals: FnvHashMap<EventId, (QueueId, Tag)>,
}

impl Events {
    /// Table with every event unsignalled.
    pub fn new() -> Self {
        Events::default()
    }

    /// Event is set by the operation at `tag` on `queue`.
    pub fn set(&mut self, event: EventId, queue: QueueId, tag: Tag) {
        self.signals.insert(event, (queue, tag));
    }

    /// Event is reset.
    pub fn reset(&mut self, event: EventId) {
        self.signals.remove(&event);
    }

    /// Queue and tag of the operation that set the event.
    pub fn signal(&self, event: EventId) -> Option<(QueueId, Tag)> {
        self.signals.get(&event).cloned()
    }

    /// Bound of the first scope of a wait on `events` executed on `queue`.
    ///
    /// Only accesses on `queue` preceding the earliest set operation
    /// are in the first scope.
    /// Returns `None` if any event isn't set on `queue`.
    pub fn wait_bound(&self, events: &[EventId], queue: QueueId) -> Option<Tag> {
        let mut bound = None;
        for event in events {
            match self.signals.get(event) {
                Some(&(signalled, tag)) if signalled == queue => {
                    bound = Some(bound.map_or(tag, |bound: Tag| bound.min(tag)));
                }
                _ => return None,
            }
        }
        bound
    }

    /// Forget all signals.
    pub fn clear(&mut self) {
        self.signals.clear();
    }
}
