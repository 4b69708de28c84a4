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

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::calendar::Clock;
use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::MemoryModel;
use crate::store::StorageKey;
use crate::store::Store;

pub const DEFAULT_MAX_NEW_CARDS_PER_DAY: u32 = 3;
pub const MAX_NEW_CARDS_PER_DAY_RANGE: RangeInclusive<i64> = 0..=100;

pub const DEFAULT_DAY_START_HOUR: u32 = 0;
pub const DAY_START_HOUR_RANGE: RangeInclusive<i64> = 0..=23;

/// User settings, as read from the store at the start of an operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub max_new_cards_per_day: u32,
    /// The hour at which a new day begins, in local time.
    pub day_start_hour: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_new_cards_per_day: DEFAULT_MAX_NEW_CARDS_PER_DAY,
            day_start_hour: DEFAULT_DAY_START_HOUR,
        }
    }
}

impl Settings {
    pub fn load(store: &impl Store) -> Fallible<Self> {
        let max_new_cards_per_day = store
            .get_json(&StorageKey::MaxNewCardsPerDay)?
            .unwrap_or(DEFAULT_MAX_NEW_CARDS_PER_DAY);
        let day_start_hour = store
            .get_json(&StorageKey::DayStartHour)?
            .unwrap_or(DEFAULT_DAY_START_HOUR);
        Ok(Self {
            max_new_cards_per_day,
            day_start_hour,
        })
    }
}

pub fn validate_max_new_cards_per_day(value: i64) -> Fallible<u32> {
    validate("Max new cards per day", value, MAX_NEW_CARDS_PER_DAY_RANGE)
}

pub fn validate_day_start_hour(value: i64) -> Fallible<u32> {
    validate("Day start hour", value, DAY_START_HOUR_RANGE)
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    pub fn set_max_new_cards_per_day(&mut self, value: i64) -> Fallible<()> {
        let value = validate_max_new_cards_per_day(value)?;
        self.store.set_json(StorageKey::MaxNewCardsPerDay, &value)?;
        log::info!("Set max new cards per day to {value}.");
        Ok(())
    }

    pub fn set_day_start_hour(&mut self, value: i64) -> Fallible<()> {
        let value = validate_day_start_hour(value)?;
        self.store.set_json(StorageKey::DayStartHour, &value)?;
        log::info!("Set day start hour to {value}.");
        Ok(())
    }
}

fn validate(name: &str, value: i64, range: RangeInclusive<i64>) -> Fallible<u32> {
    if !range.contains(&value) {
        return Err(ErrorReport::invalid(format!(
            "{name} must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    u32::try_from(value).map_err(|_| ErrorReport::invalid(format!("{name} is out of range")))
}
