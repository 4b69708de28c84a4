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

use serde::Deserialize;
use serde::Serialize;

use crate::calendar::Clock;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::fsrs::MemoryModel;
use crate::store::StorageKey;
use crate::store::Store;

/// Free-form text attached to a card, keyed by card ID.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    pub fn get_note(&self, card_id: &str) -> Fallible<Option<Note>> {
        self.store.get_json(&StorageKey::Note(card_id.to_string()))
    }

    /// Save a note. Saving blank text deletes the note.
    pub fn save_note(&mut self, card_id: &str, text: &str) -> Fallible<()> {
        if text.trim().is_empty() {
            return self.delete_note(card_id);
        }
        let note = Note {
            text: text.to_string(),
        };
        self.store
            .set_json(StorageKey::Note(card_id.to_string()), &note)?;
        log::debug!("Saved note for card {card_id}.");
        Ok(())
    }

    pub fn delete_note(&mut self, card_id: &str) -> Fallible<()> {
        self.store.remove(StorageKey::Note(card_id.to_string()))?;
        log::debug!("Deleted note for card {card_id}.");
        Ok(())
    }
}
