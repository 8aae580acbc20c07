//! Timer queue
//!
//! One-shot and periodic timers for the cooperative event loop.
//! Nothing runs on its own: the loop asks for the next expired timer
//! with `pop_due(now)` and routes it to the owning binding.
//! Periodic timers re-arm from their scheduled deadline (not from
//! `now`), so a late poll catches up tick by tick in order.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::binder::ElementId;

/// Opaque timer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    owner: ElementId,
    due: Instant,
    period: Option<Duration>,
}

/// An expired timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub handle: TimerHandle,
    pub owner: ElementId,
    /// Scheduled deadline (not the poll time)
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct Timers {
    entries: HashMap<TimerHandle, TimerEntry>,
    next_id: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, entry: TimerEntry) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(handle, entry);
        handle
    }

    /// Fire once at `due`
    pub fn once(&mut self, owner: ElementId, due: Instant) -> TimerHandle {
        self.insert(TimerEntry {
            owner,
            due,
            period: None,
        })
    }

    /// Fire at `first`, then every `period`
    pub fn every(&mut self, owner: ElementId, first: Instant, period: Duration) -> TimerHandle {
        self.insert(TimerEntry {
            owner,
            due: first,
            period: Some(period.max(Duration::from_millis(1))),
        })
    }

    /// Cancel a timer. Returns false if it was not live.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Live timers belonging to `owner`
    pub fn live_for(&self, owner: ElementId) -> usize {
        self.entries.values().filter(|e| e.owner == owner).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.due).min()
    }

    /// Take the earliest timer due at or before `now`.
    /// Ties resolve in creation order.
    pub fn pop_due(&mut self, now: Instant) -> Option<Expired> {
        let (&handle, entry) = self
            .entries
            .iter()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(h, e)| (e.due, **h))?;
        let entry = *entry;

        match entry.period {
            Some(period) => {
                if let Some(live) = self.entries.get_mut(&handle) {
                    live.due = entry.due + period;
                }
            }
            None => {
                self.entries.remove(&handle);
            }
        }

        Some(Expired {
            handle,
            owner: entry.owner,
            at: entry.due,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_once_fires_once() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.once(0, t0 + ms(10));
        assert_eq!(timers.pop_due(t0 + ms(9)), None);
        let exp = timers.pop_due(t0 + ms(10)).unwrap();
        assert_eq!(exp.handle, h);
        assert_eq!(exp.at, t0 + ms(10));
        assert_eq!(timers.pop_due(t0 + ms(100)), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_every_catches_up_in_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.every(1, t0 + ms(100), ms(100));
        let mut ticks = Vec::new();
        while let Some(exp) = timers.pop_due(t0 + ms(350)) {
            ticks.push(exp.at - t0);
        }
        assert_eq!(ticks, vec![ms(100), ms(200), ms(300)]);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(400)));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.every(2, t0, ms(5));
        assert!(timers.is_live(h));
        assert_eq!(timers.live_for(2), 1);
        assert!(timers.cancel(h));
        assert!(!timers.cancel(h));
        assert_eq!(timers.pop_due(t0 + ms(50)), None);
    }

    #[test]
    fn test_earliest_first_across_owners() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.once(7, t0 + ms(30));
        timers.once(8, t0 + ms(10));
        assert_eq!(timers.pop_due(t0 + ms(40)).unwrap().owner, 8);
        assert_eq!(timers.pop_due(t0 + ms(40)).unwrap().owner, 7);
    }
}
