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

//! The memory model: an FSRS scheduler behind the `MemoryModel` trait.
//!
//! The rest of the crate only reads `state` and `due` from a `MemoryState`;
//! everything else is owned by the model.

use chrono::Duration;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::types::timestamp::Timestamp;

pub type Recall = f64;
pub type Stability = f64;
pub type Difficulty = f64;
/// Time in days.
pub type T = f64;

const F: f64 = 19.0 / 81.0;
const C: f64 = -0.5;

const W: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, ValueEnum,
)]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    #[cfg(test)]
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl From<Grade> for f64 {
    fn from(g: Grade) -> f64 {
        match g {
            Grade::Again => 1.0,
            Grade::Hard => 2.0,
            Grade::Good => 3.0,
            Grade::Easy => 4.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub const ALL: [CardState; 4] = [
        CardState::New,
        CardState::Learning,
        CardState::Review,
        CardState::Relearning,
    ];
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    pub state: CardState,
    pub due: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<Timestamp>,
    pub stability: Stability,
    pub difficulty: Difficulty,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub reps: u32,
    pub lapses: u32,
}

/// Turns a memory state and a grade into the next memory state.
///
/// Implementations must be deterministic for identical inputs and must never
/// decrease `reps` or `lapses`.
pub trait MemoryModel {
    /// The state of a card that has never been graded: `New`, due at `now`.
    fn create_empty(&self, now: Timestamp) -> MemoryState;

    fn schedule(&self, memory: &MemoryState, grade: Grade, now: Timestamp) -> MemoryState;
}

pub struct Fsrs {
    desired_retention: Recall,
    maximum_interval: u32,
}

impl Fsrs {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            desired_retention: config.desired_retention,
            maximum_interval: config.maximum_interval,
        }
    }

    fn interval_days(&self, s: Stability) -> u32 {
        let raw = interval(self.desired_retention, s).round();
        raw.clamp(1.0, f64::from(self.maximum_interval)) as u32
    }
}

impl Default for Fsrs {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}

impl MemoryModel for Fsrs {
    fn create_empty(&self, now: Timestamp) -> MemoryState {
        MemoryState {
            state: CardState::New,
            due: now,
            last_review: None,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
        }
    }

    fn schedule(&self, memory: &MemoryState, grade: Grade, now: Timestamp) -> MemoryState {
        let elapsed: T = match memory.last_review {
            Some(last) => ((now.as_millis() - last.as_millis()) as f64 / MILLIS_PER_DAY).max(0.0),
            None => 0.0,
        };
        let (stability, difficulty) = match memory.state {
            CardState::New => (initial_stability(grade), initial_difficulty(grade)),
            // Imported states may carry no usable stability.
            _ if memory.stability <= 0.0 => (initial_stability(grade), initial_difficulty(grade)),
            _ => {
                let r = retrievability(elapsed, memory.stability);
                (
                    new_stability(memory.difficulty, memory.stability, r, grade),
                    new_difficulty(memory.difficulty, grade),
                )
            }
        };

        let mut next = memory.clone();
        next.stability = stability;
        next.difficulty = difficulty;
        next.elapsed_days = elapsed.floor() as u32;
        next.last_review = Some(now);
        next.reps = memory.reps.saturating_add(1);

        let short = |minutes: i64| (now + Duration::minutes(minutes), 0);
        let (state, (due, scheduled_days)) = match (memory.state, grade) {
            (CardState::New, Grade::Again) => (CardState::Learning, short(1)),
            (CardState::New, Grade::Hard) => (CardState::Learning, short(5)),
            (CardState::New, Grade::Good) => (CardState::Learning, short(10)),
            (CardState::Review, Grade::Again) => {
                next.lapses = memory.lapses.saturating_add(1);
                (CardState::Relearning, short(10))
            }
            (learning @ (CardState::Learning | CardState::Relearning), Grade::Again) => {
                (learning, short(1))
            }
            (learning @ (CardState::Learning | CardState::Relearning), Grade::Hard) => {
                (learning, short(5))
            }
            _ => {
                let days = self.interval_days(stability);
                let due = now + Duration::days(i64::from(days));
                (CardState::Review, (due, days))
            }
        };
        next.state = state;
        next.due = due;
        next.scheduled_days = scheduled_days;
        next
    }
}

pub fn retrievability(t: T, s: Stability) -> Recall {
    if s <= 0.0 {
        return 0.0;
    }
    (1.0 + F * (t / s)).powf(C)
}

pub fn interval(r_d: Recall, s: Stability) -> T {
    (s / F) * (r_d.powf(1.0 / C) - 1.0)
}

pub fn initial_stability(g: Grade) -> Stability {
    match g {
        Grade::Again => W[0],
        Grade::Hard => W[1],
        Grade::Good => W[2],
        Grade::Easy => W[3],
    }
}

pub fn initial_difficulty(g: Grade) -> Difficulty {
    let g: f64 = g.into();
    clamp_d(W[4] - f64::exp(W[5] * (g - 1.0)) + 1.0)
}

fn clamp_d(d: Difficulty) -> Difficulty {
    d.clamp(1.0, 10.0)
}

pub fn new_stability(d: Difficulty, s: Stability, r: Recall, g: Grade) -> Stability {
    if g == Grade::Again {
        s_fail(d, s, r)
    } else {
        s_success(d, s, r, g)
    }
}

fn s_success(d: Difficulty, s: Stability, r: Recall, g: Grade) -> Stability {
    let t_d = 11.0 - d;
    let t_s = s.powf(-W[9]);
    let t_r = f64::exp(W[10] * (1.0 - r)) - 1.0;
    let h = if g == Grade::Hard { W[15] } else { 1.0 };
    let b = if g == Grade::Easy { W[16] } else { 1.0 };
    let c = f64::exp(W[8]);
    let alpha = 1.0 + t_d * t_s * t_r * h * b * c;
    s * alpha
}

fn s_fail(d: Difficulty, s: Stability, r: Recall) -> Stability {
    let d_f = d.powf(-W[12]);
    let s_f = (s + 1.0).powf(W[13]) - 1.0;
    let r_f = f64::exp(W[14] * (1.0 - r));
    let c_f = W[11];
    let s_f = d_f * s_f * r_f * c_f;
    f64::min(s_f, s)
}

pub fn new_difficulty(d: Difficulty, g: Grade) -> Difficulty {
    clamp_d(W[7] * initial_difficulty(Grade::Easy) + (1.0 - W[7]) * dp(d, g))
}

fn dp(d: Difficulty, g: Grade) -> f64 {
    d + delta_d(g) * ((10.0 - d) / 9.0)
}

fn delta_d(g: Grade) -> f64 {
    let g: f64 = g.into();
    -W[6] * (g - 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Timestamp {
        Timestamp::from_millis(1_710_498_600_000).unwrap()
    }

    fn graded(model: &Fsrs, grades: &[Grade], step: Duration) -> MemoryState {
        let mut now = t0();
        let mut memory = model.create_empty(now);
        for grade in grades {
            memory = model.schedule(&memory, *grade, now);
            now = now + step;
        }
        memory
    }

    #[test]
    fn test_create_empty() {
        let model = Fsrs::default();
        let memory = model.create_empty(t0());
        assert_eq!(memory.state, CardState::New);
        assert_eq!(memory.due, t0());
        assert_eq!(memory.last_review, None);
        assert_eq!(memory.reps, 0);
    }

    #[test]
    fn test_new_card_graded_good_enters_learning() {
        let model = Fsrs::default();
        let memory = graded(&model, &[Grade::Good], Duration::zero());
        assert_eq!(memory.state, CardState::Learning);
        assert!(memory.due > t0());
        assert_eq!(memory.reps, 1);
        assert_eq!(memory.last_review, Some(t0()));
    }

    #[test]
    fn test_new_card_graded_easy_goes_to_review() {
        let model = Fsrs::default();
        let memory = graded(&model, &[Grade::Easy], Duration::zero());
        assert_eq!(memory.state, CardState::Review);
        assert!(memory.scheduled_days >= 1);
        assert_eq!(memory.due, t0() + Duration::days(i64::from(memory.scheduled_days)));
    }

    #[test]
    fn test_lapse_moves_to_relearning() {
        let model = Fsrs::default();
        let memory = graded(
            &model,
            &[Grade::Good, Grade::Good, Grade::Again],
            Duration::days(5),
        );
        assert_eq!(memory.state, CardState::Relearning);
        assert_eq!(memory.lapses, 1);
        assert_eq!(memory.reps, 3);
    }

    #[test]
    fn test_interval_is_clamped() {
        let model = Fsrs::new(&SchedulerConfig {
            desired_retention: 0.9,
            maximum_interval: 3,
        });
        let memory = graded(&model, &[Grade::Easy], Duration::zero());
        assert_eq!(memory.scheduled_days, 3);
    }

    #[test]
    fn test_deterministic() {
        let model = Fsrs::default();
        let grades = [Grade::Hard, Grade::Good, Grade::Easy, Grade::Again, Grade::Good];
        let a = graded(&model, &grades, Duration::hours(30));
        let b = graded(&model, &grades, Duration::hours(30));
        assert_eq!(a, b);
    }

    #[test]
    fn test_counters_never_regress() {
        let model = Fsrs::default();
        let mut now = t0();
        let mut memory = model.create_empty(now);
        for grade in Grade::ALL.iter().cycle().take(12) {
            let next = model.schedule(&memory, *grade, now);
            assert!(next.reps > memory.reps);
            assert!(next.lapses >= memory.lapses);
            memory = next;
            now = now + Duration::days(2);
        }
    }

    #[test]
    fn test_retrievability_at_zero_elapsed_is_one() {
        assert_eq!(retrievability(0.0, 3.0), 1.0);
    }

    #[test]
    fn test_initial_difficulty_is_clamped() {
        for grade in Grade::ALL {
            let d = initial_difficulty(grade);
            assert!((1.0..=10.0).contains(&d));
        }
    }
}
