use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Deferred actions keyed by a virtual due time in milliseconds.
///
/// Timers due at the same millisecond fire in scheduling order. Cancelled
/// timers are dropped from the payload map and skipped lazily when their heap
/// entry surfaces.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    pending: BTreeMap<u64, T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: BTreeMap::new(),
            next_seq: 1,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((due_ms, seq)));
        self.pending.insert(seq, payload);
        TimerId(seq)
    }

    /// Cancel every pending timer whose payload matches. Returns the count.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, payload| !pred(payload));
        before - self.pending.len()
    }

    /// Pop the earliest live timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, u64, T)> {
        while let Some(Reverse((due, seq))) = self.heap.peek().copied() {
            if !self.pending.contains_key(&seq) {
                self.heap.pop();
                continue;
            }
            if due > now_ms {
                return None;
            }
            self.heap.pop();
            let payload = self.pending.remove(&seq)?;
            return Some((TimerId(seq), due, payload));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(300, "late");
        timers.schedule(100, "early");
        timers.schedule(200, "middle");

        assert!(timers.pop_due(50).is_none());

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(1_000))
            .map(|(_, due, p)| (due, p))
            .collect();
        assert_eq!(fired, vec![(100, "early"), (200, "middle"), (300, "late")]);
        assert!(timers.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn same_due_time_keeps_schedule_order() {
        let mut timers = TimerQueue::new();
        for n in 0..5 {
            timers.schedule(10, n);
        }
        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(10))
            .map(|(_, _, p)| p)
            .collect();
        assert_eq!(fired, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, 'a');
        timers.schedule(20, 'b');

        assert_eq!(timers.cancel_where(|c| *c == 'a'), 1);
        assert_eq!(timers.cancel_where(|c| *c == 'a'), 0);

        let (_, due, payload) = timers.pop_due(100).unwrap();
        assert_eq!((due, payload), (20, 'b'));
        assert!(timers.pop_due(100).is_none());
    }

    #[test]
    fn cancel_where_filters_payloads() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, 1);
        timers.schedule(10, 2);
        timers.schedule(10, 3);

        assert_eq!(timers.cancel_where(|n| n % 2 == 1), 2);
        assert_eq!(timers.pop_due(10).map(|(_, _, p)| p), Some(2));
        assert!(timers.pop_due(10).is_none());
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut timers = TimerQueue::new();
        timers.schedule(500, ());
        assert!(timers.pop_due(499).is_none());
        assert!(timers.pop_due(500).is_some());
    }
}
