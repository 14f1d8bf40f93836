//! First-improvement 2-opt and or-opt over a depot-closed path.
//!
//! The search works on `[0, stops…, 0]` and assumes a symmetric matrix, so a
//! reversed segment keeps its internal cost.

use std::time::Instant;

use dispatch_core::DistanceMatrix;

const DEPOT: usize = 0;

pub(crate) struct LocalSearch<'a> {
    matrix: &'a DistanceMatrix,
    deadline: Instant,
    max_segment_len: usize,
}

impl<'a> LocalSearch<'a> {
    pub(crate) const fn new(
        matrix: &'a DistanceMatrix,
        deadline: Instant,
        max_segment_len: usize,
    ) -> Self {
        Self {
            matrix,
            deadline,
            max_segment_len,
        }
    }

    /// Improve `tour` until no move helps or the deadline passes.
    pub(crate) fn run(&self, tour: Vec<usize>) -> Vec<usize> {
        let mut path = Vec::with_capacity(tour.len() + 2);
        path.push(DEPOT);
        path.extend(tour);
        path.push(DEPOT);

        while !self.expired() && (self.two_opt(&mut path) || self.or_opt(&mut path)) {}

        path.into_iter().filter(|&node| node != DEPOT).collect()
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn arc(&self, path: &[usize], from: usize, to: usize) -> u64 {
        self.matrix.get(node_at(path, from), node_at(path, to))
    }

    /// Reverse the first segment whose reversal shortens the path.
    fn two_opt(&self, path: &mut [usize]) -> bool {
        let last = path.len().saturating_sub(2);
        for i in 1..last {
            if self.expired() {
                return false;
            }
            for j in (i + 1)..=last {
                let removed = self
                    .arc(path, i - 1, i)
                    .saturating_add(self.arc(path, j, j + 1));
                let added = self
                    .arc(path, i - 1, j)
                    .saturating_add(self.arc(path, i, j + 1));
                if added < removed {
                    if let Some(segment) = path.get_mut(i..=j) {
                        segment.reverse();
                    }
                    return true;
                }
            }
        }
        false
    }

    /// Relocate the first short segment whose move shortens the path.
    fn or_opt(&self, path: &mut Vec<usize>) -> bool {
        let last = path.len().saturating_sub(2);
        for len in 1..=self.max_segment_len {
            for start in 1..=last {
                let end = start + len - 1;
                if end > last {
                    break;
                }
                if self.expired() {
                    return false;
                }
                if let Some(gap) = self.best_gap(path, start, end) {
                    relocate(path, start, end, gap);
                    return true;
                }
            }
        }
        false
    }

    /// First gap `(k, k + 1)` outside `start..=end` where the segment fits
    /// more cheaply than where it sits.
    fn best_gap(&self, path: &[usize], start: usize, end: usize) -> Option<usize> {
        let last = path.len().saturating_sub(2);
        let detached = self
            .arc(path, start - 1, start)
            .saturating_add(self.arc(path, end, end + 1));
        let bridge = self.arc(path, start - 1, end + 1);
        (0..=last)
            .filter(|&k| k + 1 < start || k > end)
            .find(|&k| {
                let old = detached.saturating_add(self.arc(path, k, k + 1));
                let new = bridge
                    .saturating_add(self.arc(path, k, start))
                    .saturating_add(self.arc(path, end, k + 1));
                new < old
            })
    }
}

fn node_at(path: &[usize], position: usize) -> usize {
    path.get(position).copied().unwrap_or(DEPOT)
}

/// Move `path[start..=end]` so it sits between positions `gap` and
/// `gap + 1` of the original path.
fn relocate(path: &mut Vec<usize>, start: usize, end: usize, gap: usize) {
    let segment: Vec<usize> = path.drain(start..=end).collect();
    let insert_at = if gap < start {
        gap + 1
    } else {
        gap + 1 - segment.len()
    };
    for (offset, node) in segment.into_iter().enumerate() {
        path.insert(insert_at + offset, node);
    }
}
