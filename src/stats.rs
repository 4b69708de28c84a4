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

//! Review statistics: per-day counters, streaks, state histograms, and
//! forecasts of upcoming reviews.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::calendar::Clock;
use crate::calendar::local_date_key;
use crate::calendar::today_key;
use crate::collection::Collection;
use crate::collection::StatsMap;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::CardState;
use crate::fsrs::Grade;
use crate::fsrs::MemoryModel;
use crate::store::StorageKey;
use crate::store::Store;
use crate::store::Write;
use crate::types::card::Card;
use crate::types::daily_stats::DailyStats;
use crate::types::date::Date;

/// The widest window `get_last_n_days_stats` and `get_next_n_days_stats`
/// accept.
pub const MAX_WINDOW_DAYS: usize = 3650;

/// The number of non-paused cards that come due on a day.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct UpcomingReviews {
    pub date: Date,
    pub count: u32,
}

/// Record one review on `today`. The day's record is created on its first
/// review, continuing yesterday's streak if there is one.
pub fn record_review(stats: &mut StatsMap, today: Date, grade: Grade, is_new_card: bool) {
    let yesterday_streak = stats.get(&today.pred()).map(|s| s.streak);
    let entry = stats.entry(today).or_insert_with(|| {
        let streak = yesterday_streak.map_or(1, |s| s + 1);
        log::debug!("Starting stats for {today} with streak {streak}.");
        DailyStats::empty(today, streak)
    });
    entry.record(grade, is_new_card);
}

/// How many cards are in each state. Every state is present.
pub fn card_state_histogram(cards: &[Card]) -> BTreeMap<CardState, u32> {
    let mut histogram: BTreeMap<CardState, u32> =
        CardState::ALL.iter().map(|state| (*state, 0)).collect();
    for card in cards {
        *histogram.entry(card.memory.state).or_insert(0) += 1;
    }
    histogram
}

/// The `n` days ending on `today`, oldest first. Days without reviews get a
/// zeroed record with a streak of 0.
pub fn last_n_days(stats: &StatsMap, today: Date, n: usize) -> Vec<DailyStats> {
    (0..n)
        .rev()
        .map(|i| {
            let date = today.plus_days(-(i as i64));
            stats
                .get(&date)
                .cloned()
                .unwrap_or_else(|| DailyStats::empty(date, 0))
        })
        .collect()
}

/// Count the non-paused cards due on each of the `n` days starting on
/// `today`. Each card counts once, on the first day it is due, so overdue
/// cards all land on `today`.
pub fn next_n_days(
    cards: &[Card],
    today: Date,
    n: usize,
    day_start_hour: u32,
) -> Vec<UpcomingReviews> {
    let mut result: Vec<UpcomingReviews> = (0..n)
        .map(|i| UpcomingReviews {
            date: today.plus_days(i as i64),
            count: 0,
        })
        .collect();
    for card in cards.iter().filter(|card| !card.paused) {
        let due = local_date_key(card.memory.due, day_start_hour);
        if let Some(slot) = result.iter_mut().find(|slot| due <= slot.date) {
            slot.count += 1;
        }
    }
    result
}

fn check_window(n: usize) -> Fallible<()> {
    if n > MAX_WINDOW_DAYS {
        return Err(ErrorReport::invalid(format!(
            "window must be at most {MAX_WINDOW_DAYS} days"
        )));
    }
    Ok(())
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    /// Record one review in today's stats. The stats are written in the
    /// same batch as `alongside`, so the review and whatever caused it are
    /// stored together or not at all.
    pub fn update_stats(
        &mut self,
        grade: Grade,
        is_new_card: bool,
        alongside: Vec<Write>,
    ) -> Fallible<()> {
        let settings = self.settings()?;
        let today = today_key(&self.clock, settings.day_start_hour);
        let mut stats = self.load_stats()?;
        record_review(&mut stats, today, grade, is_new_card);
        let mut writes = alongside;
        writes.push(Write::json(StorageKey::Stats, &stats)?);
        self.store.apply(writes)
    }

    pub fn get_stats_for_date(&self, date: Date) -> Fallible<Option<DailyStats>> {
        Ok(self.load_stats()?.remove(&date))
    }

    pub fn get_today_stats(&self) -> Fallible<Option<DailyStats>> {
        let settings = self.settings()?;
        self.get_stats_for_date(today_key(&self.clock, settings.day_start_hour))
    }

    /// Every stored record, newest first.
    pub fn get_all_stats(&self) -> Fallible<Vec<DailyStats>> {
        Ok(self.load_stats()?.into_values().rev().collect())
    }

    /// Paused cards are counted too.
    pub fn get_card_state_stats(&self) -> Fallible<BTreeMap<CardState, u32>> {
        Ok(card_state_histogram(&self.get_all_cards()?))
    }

    pub fn get_last_n_days_stats(&self, n: usize) -> Fallible<Vec<DailyStats>> {
        check_window(n)?;
        let settings = self.settings()?;
        let today = today_key(&self.clock, settings.day_start_hour);
        Ok(last_n_days(&self.load_stats()?, today, n))
    }

    pub fn get_next_n_days_stats(&self, n: usize) -> Fallible<Vec<UpcomingReviews>> {
        check_window(n)?;
        let settings = self.settings()?;
        let today = today_key(&self.clock, settings.day_start_hour);
        let cards = self.get_all_cards()?;
        Ok(next_n_days(&cards, today, n, settings.day_start_hour))
    }
}
