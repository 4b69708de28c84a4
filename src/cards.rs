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

//! Card lifecycle: add, list, remove, delay, pause, and grade.

use serde::Serialize;

use crate::calendar::Clock;
use crate::calendar::is_due_by_date;
use crate::collection::CardMap;
use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::fsrs::MemoryModel;
use crate::store::StorageKey;
use crate::store::Store;
use crate::store::Write;
use crate::types::card::Card;
use crate::types::card::Difficulty;
use crate::types::timestamp::Timestamp;

/// The outcome of grading a card.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedCard {
    pub card: Card,
    /// The card is still due today after grading, so it should be shown
    /// again later in the same session.
    pub should_requeue: bool,
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    fn create_card(
        &self,
        slug: &str,
        name: &str,
        external_id: &str,
        difficulty: Difficulty,
        now: Timestamp,
    ) -> Card {
        Card::new(
            slug,
            name,
            external_id,
            difficulty,
            now,
            self.model.create_empty(now),
        )
    }

    fn save_cards(&mut self, cards: &CardMap) -> Fallible<()> {
        self.store.set_json(StorageKey::Cards, cards)
    }

    /// Add a card. If a card with this slug exists, it is returned as-is.
    pub fn add_card(
        &mut self,
        slug: &str,
        name: &str,
        external_id: &str,
        difficulty: Difficulty,
    ) -> Fallible<Card> {
        let mut cards = self.load_cards()?;
        if let Some(card) = cards.get(slug) {
            log::debug!("Card {slug} already exists.");
            return Ok(card.clone());
        }
        let card = self.create_card(slug, name, external_id, difficulty, self.clock.now());
        cards.insert(slug.to_string(), card.clone());
        self.save_cards(&cards)?;
        log::info!("Added card {slug} ({}).", card.id);
        Ok(card)
    }

    pub fn get_all_cards(&self) -> Fallible<Vec<Card>> {
        Ok(self.load_cards()?.into_values().collect())
    }

    pub fn get_card(&self, slug: &str) -> Fallible<Card> {
        self.load_cards()?
            .remove(slug)
            .ok_or_else(|| ErrorReport::not_found(slug))
    }

    /// Remove a card and its note. Removing an unknown slug does nothing.
    pub fn remove_card(&mut self, slug: &str) -> Fallible<()> {
        let mut cards = self.load_cards()?;
        if let Some(card) = cards.remove(slug) {
            self.store.apply(vec![
                Write::Remove(StorageKey::Note(card.id)),
                Write::json(StorageKey::Cards, &cards)?,
            ])?;
            log::info!("Removed card {slug}.");
        }
        Ok(())
    }

    /// Push a card's due date back by `days` calendar days, counting from
    /// its current due date.
    pub fn delay_card(&mut self, slug: &str, days: i64) -> Fallible<Card> {
        let mut cards = self.load_cards()?;
        let card = cards
            .get_mut(slug)
            .ok_or_else(|| ErrorReport::not_found(slug))?;
        card.memory.due = card.memory.due.add_local_days(days)?;
        let card = card.clone();
        self.save_cards(&cards)?;
        log::info!("Delayed card {slug} by {days} days, now due {}.", card.due());
        Ok(card)
    }

    pub fn set_pause_status(&mut self, slug: &str, paused: bool) -> Fallible<Card> {
        let mut cards = self.load_cards()?;
        let card = cards
            .get_mut(slug)
            .ok_or_else(|| ErrorReport::not_found(slug))?;
        card.paused = paused;
        let card = card.clone();
        self.save_cards(&cards)?;
        log::info!("Set card {slug} paused={paused}.");
        Ok(card)
    }

    /// Grade a card, creating it first if it does not exist, and record the
    /// review in today's stats.
    pub fn rate_card(
        &mut self,
        slug: &str,
        name: &str,
        grade: Grade,
        external_id: &str,
        difficulty: Difficulty,
    ) -> Fallible<RatedCard> {
        let settings = self.settings()?;
        let mut cards = self.load_cards()?;

        let now = self.clock.now();
        let mut card = match cards.get(slug) {
            Some(card) => card.clone(),
            None => self.create_card(slug, name, external_id, difficulty, now),
        };
        let was_new = card.is_new();

        card.memory = self.model.schedule(&card.memory, grade, now);
        cards.insert(slug.to_string(), card.clone());

        self.update_stats(grade, was_new, vec![Write::json(StorageKey::Cards, &cards)?])?;

        let should_requeue = is_due_by_date(card.memory.due, now, settings.day_start_hour);
        log::info!(
            "Rated {slug} {}: state={:?} due={} requeue={should_requeue}",
            grade.as_str(),
            card.memory.state,
            card.due(),
        );
        Ok(RatedCard {
            card,
            should_requeue,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::calendar::FixedClock;
    use crate::error::ErrorKind;
    use crate::fsrs::CardState;
    use crate::fsrs::Fsrs;
    use crate::helper::TestCollection;
    use crate::helper::local;
    use crate::helper::test_collection;
    use crate::store::MemoryStore;

    fn coll() -> TestCollection {
        test_collection(local(2024, 3, 15, 10, 30, 0))
    }

    #[test]
    fn test_add_card() -> Fallible<()> {
        let mut coll = coll();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        assert_eq!(card.slug, "two-sum");
        assert_eq!(card.name, "Two Sum");
        assert_eq!(card.external_id, "1");
        assert_eq!(card.created_at, local(2024, 3, 15, 10, 30, 0));
        assert_eq!(card.memory.state, CardState::New);
        assert_eq!(card.memory.due, card.created_at);
        assert!(!card.paused);
        assert_eq!(coll.get_all_cards()?, vec![card]);
        Ok(())
    }

    #[test]
    fn test_add_card_is_idempotent() -> Fallible<()> {
        let mut coll = coll();
        let first = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.clock.advance(Duration::hours(3));
        let second = coll.add_card("two-sum", "Renamed", "99", Difficulty::Hard)?;
        assert_eq!(first, second);
        assert_eq!(second.name, "Two Sum");
        assert_eq!(second.difficulty, Difficulty::Easy);
        assert_eq!(coll.get_all_cards()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_get_all_cards_empty() -> Fallible<()> {
        assert!(coll().get_all_cards()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_get_card() -> Fallible<()> {
        let mut coll = coll();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        assert_eq!(coll.get_card("two-sum")?, card);
        let err = coll.get_card("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_remove_card() -> Fallible<()> {
        let mut coll = coll();
        coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.add_card("3sum", "3Sum", "15", Difficulty::Medium)?;
        coll.remove_card("two-sum")?;
        let slugs: Vec<String> = coll.get_all_cards()?.into_iter().map(|c| c.slug).collect();
        assert_eq!(slugs, vec!["3sum".to_string()]);
        Ok(())
    }

    #[test]
    fn test_remove_card_deletes_its_note() -> Fallible<()> {
        let mut coll = coll();
        let keep = coll.add_card("3sum", "3Sum", "15", Difficulty::Medium)?;
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.save_note(&card.id, "use a hash map")?;
        coll.save_note(&keep.id, "sort first")?;
        coll.remove_card("two-sum")?;
        assert_eq!(coll.get_note(&card.id)?, None);
        assert!(coll.get_note(&keep.id)?.is_some());
        Ok(())
    }

    /// Fails any batch that writes `rejected`, without applying any of it.
    struct RejectingStore {
        inner: MemoryStore,
        rejected: Option<StorageKey>,
    }

    impl Store for RejectingStore {
        fn get(&self, key: &StorageKey) -> Fallible<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn apply(&mut self, writes: Vec<Write>) -> Fallible<()> {
            let touches = |write: &Write| match write {
                Write::Set(key, _) | Write::Remove(key) => Some(key) == self.rejected.as_ref(),
            };
            if writes.iter().any(touches) {
                return Err(ErrorReport::with_kind(ErrorKind::Storage, "disk full"));
            }
            self.inner.apply(writes)
        }
    }

    fn rejecting_collection() -> Collection<RejectingStore, FixedClock, Fsrs> {
        let store = RejectingStore {
            inner: MemoryStore::new(),
            rejected: None,
        };
        Collection::new(
            store,
            FixedClock::new(local(2024, 3, 15, 10, 30, 0)),
            Fsrs::default(),
        )
    }

    #[test]
    fn test_failed_remove_keeps_card_and_note() -> Fallible<()> {
        let mut coll = rejecting_collection();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.save_note(&card.id, "use a hash map")?;
        coll.store.rejected = Some(StorageKey::Cards);
        let err = coll.remove_card("two-sum").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        coll.store.rejected = None;
        assert_eq!(coll.get_card("two-sum")?, card);
        assert_eq!(coll.get_note(&card.id)?.unwrap().text, "use a hash map");
        Ok(())
    }

    #[test]
    fn test_failed_rate_changes_nothing() -> Fallible<()> {
        let mut coll = rejecting_collection();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.store.rejected = Some(StorageKey::Stats);
        assert!(
            coll.rate_card("two-sum", "Two Sum", Grade::Good, "1", Difficulty::Easy)
                .is_err()
        );
        coll.store.rejected = None;
        assert_eq!(coll.get_card("two-sum")?, card);
        assert!(coll.get_all_stats()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_remove_missing_card_is_a_no_op() -> Fallible<()> {
        let mut coll = coll();
        coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.remove_card("nope")?;
        assert_eq!(coll.get_all_cards()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_delay_card() -> Fallible<()> {
        let mut coll = coll();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        let delayed = coll.delay_card("two-sum", 2)?;
        assert_eq!(delayed.memory.due, local(2024, 3, 17, 10, 30, 0));
        assert_eq!(delayed.memory.state, card.memory.state);
        assert_eq!(delayed.memory.reps, card.memory.reps);
        assert_eq!(coll.get_all_cards()?, vec![delayed]);
        Ok(())
    }

    #[test]
    fn test_delays_compound() -> Fallible<()> {
        let mut coll = coll();
        coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        let first = coll.delay_card("two-sum", 2)?;
        // Delaying counts from the due date, not from now.
        coll.clock.advance(Duration::days(1));
        let second = coll.delay_card("two-sum", 3)?;
        assert_eq!(second.memory.due, first.memory.due.add_local_days(3)?);
        assert_eq!(second.memory.due, local(2024, 3, 20, 10, 30, 0));
        Ok(())
    }

    #[test]
    fn test_delay_missing_card() {
        let mut coll = coll();
        let err = coll.delay_card("nope", 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_pause_and_resume() -> Fallible<()> {
        let mut coll = coll();
        coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        assert!(coll.set_pause_status("two-sum", true)?.paused);
        assert!(coll.set_pause_status("two-sum", true)?.paused);
        assert!(coll.get_all_cards()?[0].paused);
        assert!(!coll.set_pause_status("two-sum", false)?.paused);
        assert!(!coll.get_all_cards()?[0].paused);
        Ok(())
    }

    #[test]
    fn test_pause_missing_card() {
        let mut coll = coll();
        let err = coll.set_pause_status("nope", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_rate_existing_card() -> Fallible<()> {
        let mut coll = coll();
        let card = coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        coll.clock.advance(Duration::minutes(5));
        let rated = coll.rate_card("two-sum", "Two Sum", Grade::Good, "1", Difficulty::Easy)?;
        assert_eq!(rated.card.id, card.id);
        assert_ne!(rated.card.memory.state, CardState::New);
        assert!(rated.card.memory.due > card.memory.due);
        assert_eq!(coll.get_all_cards()?, vec![rated.card]);

        let today = coll.get_today_stats()?.unwrap();
        assert_eq!(today.new_cards, 1);
        assert_eq!(today.reviewed_cards, 0);
        assert_eq!(today.total_reviews, 1);
        assert_eq!(today.grade_breakdown.good, 1);
        Ok(())
    }

    #[test]
    fn test_rate_creates_missing_card() -> Fallible<()> {
        let mut coll = coll();
        let rated = coll.rate_card("two-sum", "Two Sum", Grade::Easy, "1", Difficulty::Easy)?;
        assert_eq!(rated.card.name, "Two Sum");
        assert_eq!(rated.card.memory.state, CardState::Review);
        assert!(!rated.should_requeue);
        assert_eq!(coll.get_all_cards()?.len(), 1);
        assert_eq!(coll.get_today_stats()?.unwrap().new_cards, 1);
        Ok(())
    }

    #[test]
    fn test_rate_review_card_counts_as_reviewed() -> Fallible<()> {
        let mut coll = coll();
        coll.rate_card("two-sum", "Two Sum", Grade::Good, "1", Difficulty::Easy)?;
        coll.clock.advance(Duration::minutes(15));
        coll.rate_card("two-sum", "Two Sum", Grade::Good, "1", Difficulty::Easy)?;
        let today = coll.get_today_stats()?.unwrap();
        assert_eq!(today.new_cards, 1);
        assert_eq!(today.reviewed_cards, 1);
        assert_eq!(today.total_reviews, 2);
        Ok(())
    }

    #[test]
    fn test_should_requeue_when_still_due_today() -> Fallible<()> {
        let mut coll = coll();
        let rated = coll.rate_card("two-sum", "Two Sum", Grade::Again, "1", Difficulty::Easy)?;
        assert_eq!(rated.card.memory.state, CardState::Learning);
        assert!(rated.should_requeue);
        let rated = coll.rate_card("two-sum", "Two Sum", Grade::Good, "1", Difficulty::Easy)?;
        assert_eq!(rated.card.memory.state, CardState::Review);
        assert!(!rated.should_requeue);
        Ok(())
    }

    #[test]
    fn test_rate_keeps_metadata_of_existing_card() -> Fallible<()> {
        let mut coll = coll();
        coll.add_card("two-sum", "Two Sum", "1", Difficulty::Easy)?;
        let rated = coll.rate_card("two-sum", "Other", Grade::Hard, "2", Difficulty::Hard)?;
        assert_eq!(rated.card.name, "Two Sum");
        assert_eq!(rated.card.difficulty, Difficulty::Easy);
        Ok(())
    }
}
