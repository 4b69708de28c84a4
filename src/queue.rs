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

//! Building the daily review queue.

use std::cmp::Ordering;

use crate::calendar::Clock;
use crate::calendar::is_due_by_date;
use crate::calendar::local_date_key;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::fsrs::MemoryModel;
use crate::settings::Settings;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Earliest due first, ties broken by slug.
fn by_due_then_slug(a: &Card, b: &Card) -> Ordering {
    a.memory
        .due
        .cmp(&b.memory.due)
        .then_with(|| a.slug.cmp(&b.slug))
}

/// Select and order the cards to review at `now`.
///
/// Every due, non-paused review card is included. New cards are limited to
/// what is left of the daily allowance after `new_cards_done_today`, taking
/// the earliest-due first so the choice is stable between calls.
pub fn build_review_queue(
    cards: Vec<Card>,
    now: Timestamp,
    settings: &Settings,
    new_cards_done_today: u32,
) -> Vec<Card> {
    let (mut new_cards, review_cards): (Vec<Card>, Vec<Card>) = cards
        .into_iter()
        .filter(|card| !card.paused)
        .filter(|card| is_due_by_date(card.memory.due, now, settings.day_start_hour))
        .partition(|card| card.is_new());

    new_cards.sort_by(by_due_then_slug);
    let remaining = settings
        .max_new_cards_per_day
        .saturating_sub(new_cards_done_today);
    new_cards.truncate(remaining as usize);

    let mut queue = review_cards;
    queue.extend(new_cards);
    queue.sort_by(by_due_then_slug);
    queue
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    pub fn get_review_queue(&self) -> Fallible<Vec<Card>> {
        let settings = self.settings()?;
        let now = self.clock.now();
        let today = local_date_key(now, settings.day_start_hour);
        let done = self
            .get_stats_for_date(today)?
            .map_or(0, |stats| stats.new_cards);
        let cards = self.get_all_cards()?;
        let queue = build_review_queue(cards, now, &settings, done);
        log::debug!(
            "Review queue has {} cards ({done} new cards done today).",
            queue.len()
        );
        Ok(queue)
    }
}
