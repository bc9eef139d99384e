use {
    syncval_command::Events,
    syncval_core::{QueueId, Tag},
};

/// Queue of a device as the simulator sees it.
#[derive(Clone, Debug)]
pub struct Queue {
    id: QueueId,
    family: u32,
    events: Events,
    last: Option<Tag>,
    submissions: u64,
}

impl Queue {
    /// Queue of the family with nothing submitted.
    pub fn new(id: QueueId, family: u32) -> Self {
        Queue {
            id,
            family,
            events: Events::new(),
            last: None,
            submissions: 0,
        }
    }

    /// Id of the queue.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Family of the queue.
    pub fn family(&self) -> u32 {
        self.family
    }

    /// Events set by commands executed on this queue.
    pub fn events(&self) -> &Events {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    /// Tag of the last batch end.
    /// `None` if nothing was submitted.
    pub fn last(&self) -> Option<Tag> {
        self.last
    }

    /// Number of submissions made.
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    pub(crate) fn mark_submitted(&mut self, last: Tag) {
        self.last = Some(last);
        self.submissions += 1;
    }

    /// Forget everything submitted.
    pub(crate) fn clear(&mut self) {
        self.events.clear();
        self.last = None;
        self.submissions = 0;
    }
}
