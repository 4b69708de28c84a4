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
use std::path::Path;

use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

pub const CONFIG_FILE_NAME: &str = "leetsrs.toml";

/// Static configuration, read from `leetsrs.toml` in the collection
/// directory. Every field has a default, so the file is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchedulerConfig {
    /// The recall probability the scheduler aims for.
    pub desired_retention: f64,
    /// The longest interval, in days, between two reviews.
    pub maximum_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            maximum_interval: 1000,
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file from `directory`, or the defaults if there is
    /// none.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No config file, using defaults.");
            return Ok(Self::default());
        }
        log::debug!("Loading config from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> Fallible<()> {
        let retention = self.scheduler.desired_retention;
        if !(retention > 0.0 && retention < 1.0) {
            return Err(ErrorReport::invalid(format!(
                "desired_retention must be between 0 and 1 (exclusive), got {retention}"
            )));
        }
        if self.scheduler.maximum_interval < 1 {
            return Err(ErrorReport::invalid("maximum_interval must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_missing_file_gives_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.scheduler, SchedulerConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE_NAME),
            "[scheduler]\nmaximum_interval = 365\n",
        )?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.scheduler.maximum_interval, 365);
        assert_eq!(config.scheduler.desired_retention, 0.9);
        Ok(())
    }

    #[test]
    fn test_out_of_range_retention() {
        let err = Config::parse("[scheduler]\ndesired_retention = 1.5\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_key() {
        let err = Config::parse("[scheduler]\nretention = 0.8\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
