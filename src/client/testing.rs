//! Scripted backend for pipeline tests.

use crate::client::ChatBackend;
use crate::models::{HanbenchError, Result};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A backend that replays a fixed script of responses (or failures) and
/// records how often it was called.
pub(crate) struct ScriptedBackend {
    name: String,
    script: RefCell<VecDeque<std::result::Result<String, String>>>,
    calls: Cell<usize>,
    released: Cell<bool>,
}

impl ScriptedBackend {
    pub(crate) fn new(name: &str, responses: &[&str]) -> Self {
        Self::with_script(
            name,
            responses.iter().map(|r| Ok((*r).to_string())).collect(),
        )
    }

    pub(crate) fn with_script(
        name: &str,
        script: Vec<std::result::Result<String, String>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
            released: Cell::new(false),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }

    pub(crate) fn released(&self) -> bool {
        self.released.get()
    }
}

impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat(&self, _prompt: &str, _system: Option<&str>, _max_new_tokens: u32) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(HanbenchError::backend(&self.name, message)),
            None => Err(HanbenchError::backend(&self.name, "script exhausted")),
        }
    }

    fn release(&mut self) {
        self.released.set(true);
    }
}
