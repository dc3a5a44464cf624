/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

/// Bounded exponential backoff with jitter for failed poll attempts.
///
/// A successful attempt resets the sequence; once `max_attempts` consecutive
/// failures have been consumed the budget is exhausted and `next_delay`
/// returns `None`.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: RetryConfig) -> Self {
        Backoff { config, attempt: 0 }
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }

        let exp = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << self.attempt.min(16))
            .min(self.config.max_delay_ms);
        self.attempt += 1;

        // Jitter up to a quarter of the delay, still capped.
        let jitter = rand::thread_rng().gen_range(0..=exp / 4);
        Some(Duration::from_millis(
            exp.saturating_add(jitter).min(self.config.max_delay_ms),
        ))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempt
    }
}
