//  Copyright 2022, The Tari Project
//
//  Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//  following conditions are met:
//
//  1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//  disclaimer.
//
//  2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//  following disclaimer in the documentation and/or other materials provided with the distribution.
//
//  3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//  products derived from this software without specific prior written permission.
//
//  THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//  INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//  DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//  SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//  SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//  WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//  USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::time::Duration;

pub trait Backoff {
    fn calculate_backoff(&self, attempts: usize) -> Duration;
}

/// Starts at `initial` and doubles with every attempt, never exceeding `max`
#[derive(Debug, Clone)]
pub struct DoublingBackoff {
    initial: Duration,
    max: Duration,
}

impl DoublingBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }
}

impl Backoff for DoublingBackoff {
    fn calculate_backoff(&self, attempts: usize) -> Duration {
        if attempts == 0 {
            return Duration::from_secs(0);
        }
        let exp = u32::try_from(attempts - 1).unwrap_or(u32::MAX).min(31);
        self.initial.saturating_mul(1u32 << exp).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// No retry pending
    Idle,
    /// A retry round will start after the given delay
    Scheduled(Duration),
    /// A retry round is in progress
    Running,
}

/// Tracks whether a repeated initial exchange is pending. The delay grows with every consecutive schedule and is reset
/// once the schedule is cancelled.
#[derive(Debug, Clone)]
pub struct RetrySchedule<B> {
    state: RetryState,
    attempts: usize,
    backoff: B,
}

impl<B: Backoff> RetrySchedule<B> {
    pub fn new(backoff: B) -> Self {
        Self {
            state: RetryState::Idle,
            attempts: 0,
            backoff,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// The delay the next call to `schedule` would use
    pub fn next_delay(&self) -> Duration {
        self.backoff.calculate_backoff(self.attempts + 1)
    }

    /// Schedules a retry and returns its delay. Returns None if a retry is already scheduled.
    pub fn schedule(&mut self) -> Option<Duration> {
        if let RetryState::Scheduled(_) = self.state {
            return None;
        }
        self.attempts += 1;
        let delay = self.backoff.calculate_backoff(self.attempts);
        self.state = RetryState::Scheduled(delay);
        Some(delay)
    }

    /// Marks a scheduled retry as running. Returns false if nothing was scheduled, i.e. the retry was cancelled in the
    /// meantime.
    pub fn fire(&mut self) -> bool {
        match self.state {
            RetryState::Scheduled(_) => {
                self.state = RetryState::Running;
                true
            },
            _ => false,
        }
    }

    /// Cancels any pending retry and resets the delay
    pub fn cancel(&mut self) {
        self.state = RetryState::Idle;
        self.attempts = 0;
    }
}
