//! # Linear routine built from a list of effects.
//!
//! [`Sequence`] yields its effects in order and finishes with the value the
//! last effect resumed it with. It has no error boundary: a failed `Invoke`
//! ends the task as `Failed`.

use std::borrow::Cow;
use std::collections::VecDeque;

use serde_json::Value;

use crate::tasks::effect::Effect;
use crate::tasks::routine::{Resume, Routine, Step};

/// Routine that runs a fixed list of effects.
pub struct Sequence {
    name: Cow<'static, str>,
    effects: VecDeque<Effect>,
    last: Value,
}

impl Sequence {
    /// Creates a sequence from effects, yielded front to back.
    pub fn new(name: impl Into<Cow<'static, str>>, effects: Vec<Effect>) -> Self {
        Self {
            name: name.into(),
            effects: effects.into(),
            last: Value::Null,
        }
    }
}

impl Routine for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, input: Resume) -> Step {
        match input.into_result() {
            Ok(v) => self.last = v,
            Err(e) => return Step::Fail(e.into()),
        }
        match self.effects.pop_front() {
            Some(effect) => Step::Yield(effect),
            None => Step::Done(std::mem::take(&mut self.last)),
        }
    }
}
