use std::time::Duration;

use chrono::{DateTime, Local};

use crate::types::TaskKind;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[derive(Debug, Clone)]
struct PeriodicTask {
    kind: TaskKind,
    interval: chrono::Duration,
    next_run: DateTime<Local>,
}

/// Fixed-interval task table. Missed intervals are not caught up: a task that is overdue
/// fires once and is rescheduled one interval after the poll that ran it.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn every(&mut self, kind: TaskKind, interval: Duration, now: DateTime<Local>) {
        let interval = to_chrono(interval);
        self.tasks.push(PeriodicTask {
            kind,
            interval,
            next_run: now + interval,
        });
    }

    /// Tasks due at `now`, in registration order.
    pub fn due(&mut self, now: DateTime<Local>) -> Vec<TaskKind> {
        let mut out = Vec::new();
        for task in &mut self.tasks {
            if task.next_run <= now {
                out.push(task.kind);
                task.next_run = now + task.interval;
            }
        }
        out
    }

    pub fn next_run(&self) -> Option<DateTime<Local>> {
        self.tasks.iter().map(|task| task.next_run).min()
    }
}

const MAX_INTERVAL_DAYS: i64 = 3650;

fn to_chrono(interval: Duration) -> chrono::Duration {
    let max = chrono::Duration::days(MAX_INTERVAL_DAYS);
    match chrono::Duration::from_std(interval) {
        Ok(value) if value < max => value,
        _ => max,
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;

    use chrono::{DateTime, Local, TimeZone};

    use super::Clock;

    pub struct ManualClock {
        now: Cell<DateTime<Local>>,
    }

    impl ManualClock {
        pub fn at(year: i32, month: u32, day: u32, hour: u32) -> Self {
            let now = Local
                .with_ymd_and_hms(year, month, day, hour, 0, 0)
                .earliest()
                .expect("valid local time");
            Self {
                now: Cell::new(now),
            }
        }

        pub fn advance(&self, by: chrono::Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Local> {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn hours(n: u64) -> Duration {
        Duration::from_secs(n * 3600)
    }

    #[test]
    fn tasks_fire_on_their_intervals() {
        let clock = ManualClock::at(2024, 1, 1, 12);
        let mut scheduler = Scheduler::new();
        scheduler.every(TaskKind::Backup, hours(1), clock.now());
        scheduler.every(TaskKind::Archive, hours(24), clock.now());
        scheduler.every(TaskKind::Cleanup, hours(25), clock.now());

        assert!(scheduler.due(clock.now()).is_empty());
        clock.advance(chrono::Duration::minutes(60));
        assert_eq!(scheduler.due(clock.now()), vec![TaskKind::Backup]);
        assert!(scheduler.due(clock.now()).is_empty());

        clock.advance(chrono::Duration::hours(23));
        assert_eq!(
            scheduler.due(clock.now()),
            vec![TaskKind::Backup, TaskKind::Archive]
        );
        clock.advance(chrono::Duration::hours(1));
        assert_eq!(
            scheduler.due(clock.now()),
            vec![TaskKind::Backup, TaskKind::Cleanup]
        );
    }

    #[test]
    fn missed_intervals_fire_once() {
        let clock = ManualClock::at(2024, 1, 1, 0);
        let mut scheduler = Scheduler::new();
        scheduler.every(TaskKind::Backup, hours(1), clock.now());

        clock.advance(chrono::Duration::hours(5));
        assert_eq!(scheduler.due(clock.now()), vec![TaskKind::Backup]);
        assert!(scheduler.due(clock.now()).is_empty());
        assert_eq!(
            scheduler.next_run(),
            Some(clock.now() + chrono::Duration::hours(1))
        );
    }
}
