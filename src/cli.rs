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

use std::fs::read_to_string;

use clap::Parser;
use clap::Subcommand;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::types::card::Difficulty;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the directory holding the collection. Defaults to the
    /// current directory.
    #[arg(long, global = true)]
    directory: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a card for a problem.
    Add {
        slug: String,
        name: String,
        /// The problem's ID on the upstream site.
        external_id: String,
        difficulty: Difficulty,
    },
    /// List all cards.
    List,
    /// Remove a card and its note.
    Remove { slug: String },
    /// Push a card's due date back by some number of days.
    Delay {
        slug: String,
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },
    /// Exclude a card from the review queue.
    Pause { slug: String },
    /// Return a paused card to the review queue.
    Resume { slug: String },
    /// Grade a card, creating it if it does not exist.
    Rate {
        slug: String,
        grade: Grade,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        external_id: String,
        #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
    },
    /// Show the cards to review now.
    Queue,
    /// Show today's review stats.
    Today,
    /// Show all daily stats records, newest first.
    Stats,
    /// Show daily stats for the last N days, oldest first.
    History { days: usize },
    /// Show how many reviews fall due on each of the next N days.
    Forecast { days: usize },
    /// Count cards in each learning state.
    States,
    /// Manage the note attached to a card.
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Print all data as JSON.
    Export,
    /// Replace all data with the contents of an export file.
    Import { file: String },
    /// Delete all data.
    Reset,
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Print a card's note.
    Get { slug: String },
    /// Set a card's note. Blank text deletes it.
    Set { slug: String, text: String },
    /// Delete a card's note.
    Delete { slug: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long, allow_negative_numbers = true)]
        max_new_cards_per_day: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        day_start_hour: Option<i64>,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Fallible<()> {
    let json: String = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let mut coll = Collection::open(cli.directory)?;
    match cli.command {
        Command::Add {
            slug,
            name,
            external_id,
            difficulty,
        } => print_json(&coll.add_card(&slug, &name, &external_id, difficulty)?),
        Command::List => print_json(&coll.get_all_cards()?),
        Command::Remove { slug } => coll.remove_card(&slug),
        Command::Delay { slug, days } => print_json(&coll.delay_card(&slug, days)?),
        Command::Pause { slug } => print_json(&coll.set_pause_status(&slug, true)?),
        Command::Resume { slug } => print_json(&coll.set_pause_status(&slug, false)?),
        Command::Rate {
            slug,
            grade,
            name,
            external_id,
            difficulty,
        } => {
            let name = if name.is_empty() { slug.clone() } else { name };
            print_json(&coll.rate_card(&slug, &name, grade, &external_id, difficulty)?)
        }
        Command::Queue => print_json(&coll.get_review_queue()?),
        Command::Today => print_json(&coll.get_today_stats()?),
        Command::Stats => print_json(&coll.get_all_stats()?),
        Command::History { days } => print_json(&coll.get_last_n_days_stats(days)?),
        Command::Forecast { days } => print_json(&coll.get_next_n_days_stats(days)?),
        Command::States => print_json(&coll.get_card_state_stats()?),
        Command::Note { command } => match command {
            NoteCommand::Get { slug } => {
                let card = coll.get_card(&slug)?;
                print_json(&coll.get_note(&card.id)?)
            }
            NoteCommand::Set { slug, text } => {
                let card = coll.get_card(&slug)?;
                coll.save_note(&card.id, &text)
            }
            NoteCommand::Delete { slug } => {
                let card = coll.get_card(&slug)?;
                coll.delete_note(&card.id)
            }
        },
        Command::Settings { command } => match command {
            SettingsCommand::Show => print_json(&coll.settings()?),
            SettingsCommand::Set {
                max_new_cards_per_day,
                day_start_hour,
            } => {
                if let Some(value) = max_new_cards_per_day {
                    coll.set_max_new_cards_per_day(value)?;
                }
                if let Some(value) = day_start_hour {
                    coll.set_day_start_hour(value)?;
                }
                print_json(&coll.settings()?)
            }
        },
        Command::Export => {
            let json: String = coll.export_data()?;
            println!("{json}");
            Ok(())
        }
        Command::Import { file } => {
            let json: String = read_to_string(&file)?;
            coll.import_data(&json)
        }
        Command::Reset => coll.reset_all_data(),
    }
}
