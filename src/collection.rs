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

use std::collections::BTreeMap;
use std::env::current_dir;
use std::path::PathBuf;

use crate::calendar::Clock;
use crate::calendar::SystemClock;
use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::Fsrs;
use crate::fsrs::MemoryModel;
use crate::settings::Settings;
use crate::store::SqliteStore;
use crate::store::StorageKey;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::daily_stats::DailyStats;
use crate::types::date::Date;

pub const DATABASE_FILE_NAME: &str = "leetsrs.db";

/// Cards keyed by slug.
pub type CardMap = BTreeMap<String, Card>;

/// Daily stats keyed by date.
pub type StatsMap = BTreeMap<Date, DailyStats>;

/// A card collection: the store it lives in, the clock that decides what
/// day it is, and the memory model that schedules reviews.
///
/// Every mutating operation loads the whole collection it touches, changes
/// it, and writes it back. Callers must not run two of them at once.
pub struct Collection<S: Store, C: Clock, M: MemoryModel> {
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) model: M,
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    pub fn new(store: S, clock: C, model: M) -> Self {
        Self {
            store,
            clock,
            model,
        }
    }

    pub fn settings(&self) -> Fallible<Settings> {
        Settings::load(&self.store)
    }

    pub(crate) fn load_cards(&self) -> Fallible<CardMap> {
        Ok(self.store.get_json(&StorageKey::Cards)?.unwrap_or_default())
    }

    pub(crate) fn load_stats(&self) -> Fallible<StatsMap> {
        Ok(self.store.get_json(&StorageKey::Stats)?.unwrap_or_default())
    }
}

impl Collection<SqliteStore, SystemClock, Fsrs> {
    /// Open the collection stored in `directory`, or in the current
    /// directory.
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE_NAME);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let store = SqliteStore::new(db_path)?;

        Ok(Self::new(store, SystemClock, Fsrs::new(&config.scheduler)))
    }
}
