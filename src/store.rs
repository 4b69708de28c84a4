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

//! The key-value store everything is persisted through.

#[cfg(test)]
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Fallible;

/// The logical keys of the store.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum StorageKey {
    Cards,
    Stats,
    /// The note attached to the card with the given ID.
    Note(String),
    MaxNewCardsPerDay,
    DayStartHour,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Cards => write!(f, "cards"),
            StorageKey::Stats => write!(f, "stats"),
            StorageKey::Note(card_id) => write!(f, "note:{card_id}"),
            StorageKey::MaxNewCardsPerDay => write!(f, "settings:maxNewCardsPerDay"),
            StorageKey::DayStartHour => write!(f, "settings:dayStartHour"),
        }
    }
}

pub enum Write {
    Set(StorageKey, Vec<u8>),
    Remove(StorageKey),
}

impl Write {
    pub fn json<T: Serialize + ?Sized>(key: StorageKey, value: &T) -> Fallible<Self> {
        Ok(Write::Set(key, serde_json::to_vec(value)?))
    }
}

pub trait Store {
    fn get(&self, key: &StorageKey) -> Fallible<Option<Vec<u8>>>;

    /// Apply a batch of writes. Either every write is applied, or none is.
    fn apply(&mut self, writes: Vec<Write>) -> Fallible<()>;

    fn remove(&mut self, key: StorageKey) -> Fallible<()> {
        self.apply(vec![Write::Remove(key)])
    }

    fn get_json<T: DeserializeOwned>(&self, key: &StorageKey) -> Fallible<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) -> Fallible<()>
    where
        Self: Sized,
    {
        self.apply(vec![Write::json(key, value)?])
    }
}

/// An in-process store, used by the tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
impl Store for MemoryStore {
    fn get(&self, key: &StorageKey) -> Fallible<Option<Vec<u8>>> {
        Ok(self.entries.get(&key.to_string()).cloned())
    }

    fn apply(&mut self, writes: Vec<Write>) -> Fallible<()> {
        for write in writes {
            match write {
                Write::Set(key, value) => {
                    self.entries.insert(key.to_string(), value);
                }
                Write::Remove(key) => {
                    self.entries.remove(&key.to_string());
                }
            }
        }
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(database_path: &str) -> Fallible<Self> {
        log::debug!("Opening database at {database_path}");
        let conn = Connection::open(database_path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Fallible<Self> {
        {
            let tx = conn.transaction()?;
            if !schema_exists(&tx)? {
                log::debug!("Creating schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &StorageKey) -> Fallible<Option<Vec<u8>>> {
        let sql = "select value from entries where key = ?;";
        let value: Option<Vec<u8>> = self
            .conn
            .query_row(sql, [key.to_string()], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn apply(&mut self, writes: Vec<Write>) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        for write in writes {
            match write {
                Write::Set(key, value) => {
                    let sql = "insert into entries (key, value) values (?, ?) on conflict (key) do update set value = excluded.value;";
                    tx.execute(sql, (key.to_string(), value))?;
                }
                Write::Remove(key) => {
                    let sql = "delete from entries where key = ?;";
                    tx.execute(sql, [key.to_string()])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["entries"], |row| row.get(0))?;
    Ok(count > 0)
}
