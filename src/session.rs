//! Drives one typing test from the first sentence to a scored result.

use crate::config::TestMode;
use crate::error::ScoreError;
use crate::result::TypingResult;
use crate::score::{score, ScoreRequest};
use crate::sentences::SentenceSource;
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::info;

/// Per-test parameters, handed in explicitly rather than read from config.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub user_name: String,
    pub mode: TestMode,
    pub word_count: usize,
    pub time_limit: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    AwaitingFirstSentence,
    Typing,
    Completed,
    TimedOut,
    Abandoned,
}

impl SessionState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::TimedOut | SessionState::Abandoned
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
    Tab,
}

/// What the caller should show after an `enter` or `tick`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Stayed,
    NextSentence(String),
    Finished(TypingResult),
}

/// Keys that never count as typed characters: NUL, backspace, tab, enter.
pub fn is_counted_key(c: char) -> bool {
    !matches!(c, '\0' | '\u{8}' | '\t' | '\r' | '\n')
}

pub struct TestSession<S: SentenceSource> {
    settings: SessionSettings,
    source: S,
    state: SessionState,
    given_text: String,
    current_sentence: Option<String>,
    typed: String,
    typed_character_count: Option<usize>,
    started_at: Option<DateTime<Local>>,
}

impl<S: SentenceSource> TestSession<S> {
    pub fn new(settings: SessionSettings, source: S) -> Self {
        Self {
            settings,
            source,
            state: SessionState::AwaitingFirstSentence,
            given_text: String::new(),
            current_sentence: None,
            typed: String::new(),
            typed_character_count: None,
            started_at: None,
        }
    }

    /// Show the first sentence and start the clock. Returns `None` if the
    /// session was already started or there is nothing to type.
    pub fn start(&mut self, now: DateTime<Local>) -> Option<String> {
        if self.state != SessionState::AwaitingFirstSentence {
            return None;
        }
        match self.source.next_sentence() {
            Some(sentence) => {
                self.given_text = sentence.clone();
                self.current_sentence = Some(sentence.clone());
                self.started_at = Some(now);
                self.state = SessionState::Typing;
                info!(user = %self.settings.user_name, mode = %self.settings.mode, "test started");
                Some(sentence)
            }
            None => {
                self.state = SessionState::Abandoned;
                None
            }
        }
    }

    pub fn key(&mut self, key: Keystroke) {
        if self.state != SessionState::Typing {
            return;
        }
        match key {
            Keystroke::Char('\u{8}') | Keystroke::Backspace => {
                self.typed.pop();
            }
            Keystroke::Char(c) if is_counted_key(c) => {
                self.typed.push(c);
                *self.typed_character_count.get_or_insert(0) += 1;
            }
            Keystroke::Char(_) | Keystroke::Tab => {}
        }
    }

    /// The user pressed enter: show another sentence or finish the test.
    pub fn enter(&mut self, now: DateTime<Local>) -> Result<Transition, ScoreError> {
        if self.state != SessionState::Typing {
            return Ok(Transition::Stayed);
        }

        let words_typed = self.typed.split_whitespace().count();
        let reached_goal =
            self.settings.mode == TestMode::Words && words_typed > self.settings.word_count;
        if !reached_goal {
            if let Some(sentence) = self.source.next_sentence() {
                self.given_text.push('\n');
                self.given_text.push_str(&sentence);
                self.current_sentence = Some(sentence.clone());
                return Ok(Transition::NextSentence(sentence));
            }
        }

        self.finish(SessionState::Completed, now)
    }

    /// Clock update; times the test out once the limit has passed.
    ///
    /// A late tick still scores the test as ending at the deadline.
    pub fn tick(&mut self, now: DateTime<Local>) -> Result<Transition, ScoreError> {
        if self.state != SessionState::Typing || self.settings.mode != TestMode::Time {
            return Ok(Transition::Stayed);
        }
        if self.elapsed(now) >= self.settings.time_limit {
            let end = self.deadline().map_or(now, |deadline| deadline.min(now));
            return self.finish(SessionState::TimedOut, end);
        }
        Ok(Transition::Stayed)
    }

    pub fn abandon(&mut self) {
        if !self.state.is_finished() {
            info!(user = %self.settings.user_name, "test abandoned");
            self.state = SessionState::Abandoned;
        }
    }

    fn deadline(&self) -> Option<DateTime<Local>> {
        let limit = chrono::Duration::from_std(self.settings.time_limit).ok()?;
        self.started_at?.checked_add_signed(limit)
    }

    fn finish(
        &mut self,
        state: SessionState,
        end: DateTime<Local>,
    ) -> Result<Transition, ScoreError> {
        self.state = state;
        info!(user = %self.settings.user_name, state = %state, "test finished");

        let request = ScoreRequest {
            given_text: self.given_text.clone(),
            typed_text: self.typed.trim().to_string(),
            typed_character_count: self.typed_character_count,
            start_time: self.started_at.unwrap_or(end),
            end_time: end,
            user_name: self.settings.user_name.clone(),
        };
        score(&request).map(Transition::Finished)
    }

    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        self.started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }

    /// Time left in a timed test.
    pub fn remaining(&self, now: DateTime<Local>) -> Option<Duration> {
        match self.settings.mode {
            TestMode::Time => Some(self.settings.time_limit.saturating_sub(self.elapsed(now))),
            TestMode::Words => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn given_text(&self) -> &str {
        &self.given_text
    }

    pub fn current_sentence(&self) -> Option<&str> {
        self.current_sentence.as_deref()
    }

    pub fn typed_text(&self) -> &str {
        &self.typed
    }

    pub fn typed_character_count(&self) -> Option<usize> {
        self.typed_character_count
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}
