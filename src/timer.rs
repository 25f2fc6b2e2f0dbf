use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time for the controller
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Handle to a scheduled timer, used to cancel it or recognise its fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// One expiry of a timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub at: Instant,
}

#[derive(Debug)]
struct Entry {
    id: TimerId,
    deadline: Instant,
    period: Option<Duration>,
}

/// Deadline-based one-shot and repeating timers, polled by whoever owns
/// them. Nothing runs on its own; `poll` reports what has come due.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, deadline: Instant, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            period,
        });
        id
    }

    pub fn schedule_once(&mut self, now: Instant, delay: Duration) -> TimerId {
        self.insert(now + delay, None)
    }

    /// First fire is one `interval` after `now`.
    pub fn schedule_repeating(&mut self, now: Instant, interval: Duration) -> TimerId {
        let interval = interval.max(Duration::from_millis(1));
        self.insert(now + interval, Some(interval))
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    #[cfg(test)]
    fn is_active(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    #[cfg(test)]
    fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Collects every timer due at `now`, oldest first.
    ///
    /// A repeating timer fires at most once per poll and its next deadline
    /// is one full period after `now`, so a late poll delays the timer
    /// instead of bunching up the missed periods.
    pub fn poll(&mut self, now: Instant) -> Vec<Fired> {
        let mut fired = Vec::new();

        for entry in &mut self.entries {
            if entry.deadline > now {
                continue;
            }
            fired.push(Fired {
                id: entry.id,
                at: entry.deadline,
            });
            if let Some(period) = entry.period {
                entry.deadline = now + period;
            }
        }

        self.entries.retain(|e| e.period.is_some() || e.deadline > now);
        fired.sort_by_key(|f| (f.at, f.id));
        fired
    }
}
