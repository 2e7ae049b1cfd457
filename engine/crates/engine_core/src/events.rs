use std::collections::{BTreeMap, VecDeque};

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Fan-out event bus. Every subscriber owns an independent queue; publishing
/// clones the event into each one, and subscribers drain at their own pace.
/// Nothing runs re-entrantly during `publish`.
#[derive(Debug)]
pub struct EventBus<E> {
    queues: BTreeMap<SubscriptionId, VecDeque<E>>,
    next: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            queues: BTreeMap::new(),
            next: 1,
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.queues.insert(id, VecDeque::new());
        id
    }

    /// Drops the subscriber and anything still queued for it.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.queues.remove(&id).is_some()
    }

    /// Deliver `event` to every current subscriber. Returns how many received it.
    pub fn publish(&mut self, event: E) -> usize {
        let count = self.queues.len();
        for queue in self.queues.values_mut() {
            queue.push_back(event.clone());
        }
        count
    }

    /// Take everything queued for `id`, in publish order.
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<E> {
        match self.queues.get_mut(&id) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(|q| q.is_empty())
    }

    /// Clear all queues, keeping subscriptions.
    pub fn clear(&mut self) {
        for queue in self.queues.values_mut() {
            queue.clear();
        }
    }
}
