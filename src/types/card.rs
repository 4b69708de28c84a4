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

use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::fsrs::CardState;
use crate::fsrs::MemoryState;
use crate::types::timestamp::Timestamp;

/// How hard the problem itself is rated by its source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, ValueEnum)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A problem being tracked for review.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Generated once, never reused.
    pub id: String,
    /// The problem's external key. Unique across cards.
    pub slug: String,
    pub name: String,
    pub external_id: String,
    pub difficulty: Difficulty,
    pub created_at: Timestamp,
    #[serde(default)]
    pub paused: bool,
    pub memory: MemoryState,
}

impl Card {
    pub fn new(
        slug: &str,
        name: &str,
        external_id: &str,
        difficulty: Difficulty,
        created_at: Timestamp,
        memory: MemoryState,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            external_id: external_id.to_string(),
            difficulty,
            created_at,
            paused: false,
            memory,
        }
    }

    pub fn is_new(&self) -> bool {
        self.memory.state == CardState::New
    }

    pub fn due(&self) -> Timestamp {
        self.memory.due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::fsrs::Fsrs;
    use crate::fsrs::MemoryModel;

    fn card(slug: &str) -> Card {
        let now = Timestamp::from_millis(1_700_000_000_000).unwrap();
        Card::new(
            slug,
            "Two Sum",
            "1",
            Difficulty::Easy,
            now,
            Fsrs::default().create_empty(now),
        )
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(card("a").id, card("a").id);
    }

    #[test]
    fn test_new_card() {
        let card = card("two-sum");
        assert!(card.is_new());
        assert!(!card.paused);
        assert_eq!(card.due(), card.created_at);
    }

    #[test]
    fn test_wire_format() -> Fallible<()> {
        let card = card("two-sum");
        let value = serde_json::to_value(&card)?;
        assert_eq!(value["slug"], "two-sum");
        assert_eq!(value["externalId"], "1");
        assert_eq!(value["difficulty"], "Easy");
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(value["memory"]["due"], 1_700_000_000_000_i64);
        assert_eq!(value["memory"]["state"], "New");
        assert!(value["memory"].get("lastReview").is_none());
        Ok(())
    }
}
