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

use std::ops::Add;

use chrono::DateTime;
use chrono::Days;
use chrono::Duration;
use chrono::Local;
use chrono::MappedLocalTime;
use chrono::Offset;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::date::Date;

/// An instant in time, with millisecond precision. Serializes as an integer
/// count of milliseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant, truncated to what survives serialization.
    pub fn now() -> Self {
        let now = Utc::now();
        Self::from_millis(now.timestamp_millis()).unwrap_or(Self(now))
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The calendar day this instant falls on in the local time zone, after
    /// moving the day boundary forward by `day_start_hour` hours.
    pub fn local_date(self, day_start_hour: u32) -> Date {
        let shifted = self.0 - Duration::hours(i64::from(day_start_hour));
        Date::new(shifted.with_timezone(&Local).date_naive())
    }

    /// Move this instant by a number of local calendar days, keeping the
    /// wall-clock time. Across a DST change this is not a multiple of 24h.
    pub fn add_local_days(self, days: i64) -> Fallible<Self> {
        self.add_days_in(&Local, days)
    }

    /// Move this instant by a number of calendar days in `tz`. A wall-clock
    /// time repeated by a fall-back change resolves to its earlier instant. A
    /// time skipped by a spring-forward change is pushed forward by the size
    /// of the gap, so 02:30 becomes 03:30.
    pub fn add_days_in<Tz: TimeZone>(self, tz: &Tz, days: i64) -> Fallible<Self> {
        let wall = self.0.with_timezone(tz).naive_local();
        let moved = if days >= 0 {
            wall.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            wall.checked_sub_days(Days::new(days.unsigned_abs()))
        }
        .ok_or_else(|| ErrorReport::invalid(format!("cannot move {self} by {days} days")))?;
        let utc: DateTime<Utc> = match tz.from_local_datetime(&moved) {
            MappedLocalTime::Single(ts) => ts.with_timezone(&Utc),
            MappedLocalTime::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            MappedLocalTime::None => {
                // Read the wall clock with the offset in force before the gap.
                let before = tz
                    .offset_from_utc_datetime(&(moved - Duration::days(1)))
                    .fix();
                (moved - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
            }
        };
        Ok(Self(utc))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Timestamp::from_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
    }
}
