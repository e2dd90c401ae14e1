//! Human-readable outcome messages collected while handling one request.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notices {
    pub ok: Vec<String>,
    pub err: Vec<String>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        self.ok.push(message.into());
    }

    pub fn err(&mut self, message: impl Into<String>) {
        self.err.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.err.is_empty()
    }
}
