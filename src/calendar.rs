// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! What day is it? Every due-ness decision goes through `local_date_key`
//! with the same `day_start_hour`.

#[cfg(test)]
use std::cell::Cell;

#[cfg(test)]
use chrono::Duration;

use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
pub struct FixedClock {
    now: Cell<Timestamp>,
    step: Cell<Duration>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Cell::new(now),
            step: Cell::new(Duration::zero()),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move forward by `step` after every read.
    pub fn tick_on_read(&self, step: Duration) {
        self.step.set(step);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let now = self.now.get();
        self.now.set(now + self.step.get());
        now
    }
}

pub fn local_date_key(instant: Timestamp, day_start_hour: u32) -> Date {
    instant.local_date(day_start_hour)
}

pub fn today_key(clock: &impl Clock, day_start_hour: u32) -> Date {
    local_date_key(clock.now(), day_start_hour)
}

/// A card is due if its due instant falls on the reference day or any day
/// before it. The time of day does not matter.
pub fn is_due_by_date(due: Timestamp, reference: Timestamp, day_start_hour: u32) -> bool {
    local_date_key(due, day_start_hour) <= local_date_key(reference, day_start_hour)
}
