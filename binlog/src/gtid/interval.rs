use std::fmt::{Display, Formatter};

use serde::Serialize;

/// A contiguous run of transaction numbers, `[start, stop)`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: i64,
    /// exclusive
    pub stop: i64,
}

impl Interval {
    pub fn new(start: i64, stop: i64) -> Self {
        Interval { start, stop }
    }

    pub fn contains(&self, other: &Interval) -> bool {
        other.start >= self.start && other.stop <= self.stop
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.stop == self.start + 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.stop - 1)
        }
    }
}

/// Sort and merge overlapping or adjacent runs in place.
pub fn normalize(intervals: &mut Vec<Interval>) {
    if intervals.is_empty() {
        return;
    }
    intervals.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals.iter() {
        match merged.last_mut() {
            Some(last) if iv.start <= last.stop => {
                if iv.stop > last.stop {
                    last.stop = iv.stop;
                }
            }
            _ => merged.push(*iv),
        }
    }
    *intervals = merged;
}
