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

use chrono::Local;
use chrono::TimeZone;

use crate::calendar::FixedClock;
use crate::collection::Collection;
use crate::fsrs::Fsrs;
use crate::store::MemoryStore;
use crate::types::timestamp::Timestamp;

pub type TestCollection = Collection<MemoryStore, FixedClock, Fsrs>;

/// An instant at the given local wall-clock time, so tests about calendar
/// days hold in any time zone.
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
    let ts = Local.with_ymd_and_hms(y, m, d, h, min, s).unwrap();
    Timestamp::from_millis(ts.timestamp_millis()).unwrap()
}

/// An empty in-memory collection whose clock is stopped at `now`.
pub fn test_collection(now: Timestamp) -> TestCollection {
    Collection::new(MemoryStore::new(), FixedClock::new(now), Fsrs::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Clock;
    use crate::error::Fallible;

    #[test]
    fn test_test_collection() -> Fallible<()> {
        let now = local(2024, 3, 15, 10, 30, 0);
        let coll = test_collection(now);
        assert_eq!(coll.clock.now(), now);
        assert!(coll.load_cards()?.is_empty());
        Ok(())
    }
}
