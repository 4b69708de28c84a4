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

//! Exporting, importing, and resetting all data.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::calendar::Clock;
use crate::collection::CardMap;
use crate::collection::Collection;
use crate::collection::StatsMap;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::MemoryModel;
use crate::notes::Note;
use crate::settings::validate_day_start_hour;
use crate::settings::validate_max_new_cards_per_day;
use crate::store::StorageKey;
use crate::store::Store;
use crate::store::Write;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub version: String,
    pub export_date: String,
    pub data: ExportData,
}

#[derive(Serialize, Deserialize)]
pub struct ExportData {
    pub cards: CardMap,
    pub stats: StatsMap,
    /// Notes keyed by card ID.
    pub notes: BTreeMap<String, Note>,
    #[serde(default)]
    pub settings: ExportSettings,
}

/// Only settings that were explicitly set are exported.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_cards_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_start_hour: Option<u32>,
}

/// Compare dotted version strings numerically. Missing or non-numeric parts
/// count as zero.
fn compare_versions(left: &str, right: &str) -> Ordering {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    let (left, right) = (parse(left), parse(right));
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Check the shape of an export document before decoding it.
fn validate_document(value: &Value) -> Fallible<()> {
    let version = value.get("version").and_then(Value::as_str);
    let export_date = value.get("exportDate").and_then(Value::as_str);
    let data = value.get("data").filter(|d| d.is_object());
    let (Some(version), Some(_), Some(data)) = (version, export_date, data) else {
        return Err(ErrorReport::invalid("Invalid export data structure"));
    };
    if compare_versions(version, APP_VERSION) == Ordering::Greater {
        return Err(ErrorReport::invalid(format!(
            "Unsupported export version: {version}. Expected: {APP_VERSION}"
        )));
    }
    for field in ["cards", "stats", "notes"] {
        if !data.get(field).is_some_and(Value::is_object) {
            return Err(ErrorReport::invalid(format!("Invalid {field} data")));
        }
    }
    Ok(())
}

impl<S: Store, C: Clock, M: MemoryModel> Collection<S, C, M> {
    pub fn export(&self) -> Fallible<Export> {
        let cards = self.load_cards()?;
        let stats = self.load_stats()?;
        let mut notes = BTreeMap::new();
        for card in cards.values() {
            if let Some(note) = self.get_note(&card.id)? {
                notes.insert(card.id.clone(), note);
            }
        }
        let settings = ExportSettings {
            max_new_cards_per_day: self.store.get_json(&StorageKey::MaxNewCardsPerDay)?,
            day_start_hour: self.store.get_json(&StorageKey::DayStartHour)?,
        };
        Ok(Export {
            version: APP_VERSION.to_string(),
            export_date: self.clock.now().to_string(),
            data: ExportData {
                cards,
                stats,
                notes,
                settings,
            },
        })
    }

    pub fn export_data(&self) -> Fallible<String> {
        let export = self.export()?;
        log::info!(
            "Exporting {} cards, {} stats records, {} notes.",
            export.data.cards.len(),
            export.data.stats.len(),
            export.data.notes.len()
        );
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Replace all data with the contents of an export document. Nothing is
    /// changed if the document is rejected.
    pub fn import_data(&mut self, json: &str) -> Fallible<()> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            ErrorReport::with_kind(ErrorKind::Format, format!("Invalid JSON format: {e}"))
        })?;
        validate_document(&value)?;
        let export: Export = serde_json::from_value(value)?;
        let data = export.data;
        if let Some((slug, _)) = data.cards.iter().find(|(slug, card)| **slug != card.slug) {
            return Err(ErrorReport::invalid(format!(
                "Invalid cards data: key {slug} does not match its card"
            )));
        }
        if let Some((date, _)) = data.stats.iter().find(|(date, record)| **date != record.date) {
            return Err(ErrorReport::invalid(format!(
                "Invalid stats data: key {date} does not match its record"
            )));
        }
        if let Some(value) = data.settings.max_new_cards_per_day {
            validate_max_new_cards_per_day(i64::from(value))?;
        }
        if let Some(value) = data.settings.day_start_hour {
            validate_day_start_hour(i64::from(value))?;
        }

        let mut writes = self.reset_writes()?;
        writes.push(Write::json(StorageKey::Cards, &data.cards)?);
        writes.push(Write::json(StorageKey::Stats, &data.stats)?);
        for (card_id, note) in &data.notes {
            writes.push(Write::json(StorageKey::Note(card_id.clone()), note)?);
        }
        if let Some(value) = data.settings.max_new_cards_per_day {
            writes.push(Write::json(StorageKey::MaxNewCardsPerDay, &value)?);
        }
        if let Some(value) = data.settings.day_start_hour {
            writes.push(Write::json(StorageKey::DayStartHour, &value)?);
        }
        self.store.apply(writes)?;
        log::info!(
            "Imported {} cards, {} stats records, {} notes from version {}.",
            data.cards.len(),
            data.stats.len(),
            data.notes.len(),
            export.version
        );
        Ok(())
    }

    /// Delete every card, stats record, note, and setting.
    pub fn reset_all_data(&mut self) -> Fallible<()> {
        let writes = self.reset_writes()?;
        self.store.apply(writes)?;
        log::info!("Reset all data.");
        Ok(())
    }

    fn reset_writes(&self) -> Fallible<Vec<Write>> {
        let mut writes = vec![
            Write::Remove(StorageKey::Cards),
            Write::Remove(StorageKey::Stats),
            Write::Remove(StorageKey::MaxNewCardsPerDay),
            Write::Remove(StorageKey::DayStartHour),
        ];
        for card in self.load_cards()?.values() {
            writes.push(Write::Remove(StorageKey::Note(card.id.clone())));
        }
        Ok(writes)
    }
}
