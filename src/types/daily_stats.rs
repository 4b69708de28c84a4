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

use crate::fsrs::Grade;
use crate::types::date::Date;

/// How many reviews got each grade.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct GradeBreakdown {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl GradeBreakdown {
    pub fn increment(&mut self, grade: Grade) {
        let slot = match grade {
            Grade::Again => &mut self.again,
            Grade::Hard => &mut self.hard,
            Grade::Good => &mut self.good,
            Grade::Easy => &mut self.easy,
        };
        *slot += 1;
    }
}

/// Review counters for one calendar day.
///
/// `total_reviews` is both `new_cards + reviewed_cards` and the sum of the
/// grade breakdown.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: Date,
    pub total_reviews: u32,
    pub grade_breakdown: GradeBreakdown,
    /// Reviews of cards that were new at the time.
    pub new_cards: u32,
    pub reviewed_cards: u32,
    /// Consecutive days with at least one review, ending on this day.
    pub streak: u32,
}

impl DailyStats {
    /// An all-zero record. Chart windows use this for days without reviews.
    pub fn empty(date: Date, streak: u32) -> Self {
        Self {
            date,
            total_reviews: 0,
            grade_breakdown: GradeBreakdown::default(),
            new_cards: 0,
            reviewed_cards: 0,
            streak,
        }
    }

    pub fn record(&mut self, grade: Grade, is_new_card: bool) {
        self.total_reviews += 1;
        self.grade_breakdown.increment(grade);
        if is_new_card {
            self.new_cards += 1;
        } else {
            self.reviewed_cards += 1;
        }
    }
}
