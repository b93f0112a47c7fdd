/*
    upfg, Unified Powered Flight Guidance for ascent vehicles
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::ConicSolution;
use std::collections::VecDeque;

/// Bounded log of past conic extrapolations, newest last.
///
/// Meant for diagnostics only: guidance never reads it. Once full, the oldest entry is evicted.
#[derive(Clone, Debug, Default)]
pub struct CserHistory {
    capacity: usize,
    entries: VecDeque<ConicSolution>,
}

impl CserHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Records a solution and returns the evicted one, if any.
    pub fn push(&mut self, solution: ConicSolution) -> Option<ConicSolution> {
        if self.capacity == 0 {
            return Some(solution);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(solution);
        evicted
    }

    pub fn latest(&self) -> Option<&ConicSolution> {
        self.entries.back()
    }

    /// Returns the solution `steps_back` records before the latest one
    pub fn previous(&self, steps_back: usize) -> Option<&ConicSolution> {
        let len = self.entries.len();
        if steps_back >= len {
            None
        } else {
            self.entries.get(len - 1 - steps_back)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the oldest to the newest solution
    pub fn iter(&self) -> impl Iterator<Item = &ConicSolution> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
