#![allow(dead_code)]

use clirpiai::error::{Error, Result};
use clirpiai::llm::{ChatBackend, Message};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Scripted stand-in for the remote service.
pub struct StubBackend {
    models: Vec<String>,
    fail_listing: bool,
    replies: RefCell<VecDeque<Result<String>>>,
    pub completions: RefCell<Vec<(String, Vec<Message>)>>,
    pub list_calls: Cell<usize>,
}

impl StubBackend {
    pub fn new(models: &[&str]) -> Self {
        Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            fail_listing: false,
            replies: RefCell::new(VecDeque::new()),
            completions: RefCell::new(Vec::new()),
            list_calls: Cell::new(0),
        }
    }

    pub fn replying(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.to_string()));
        self
    }

    pub fn failing(self) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Err(Error::http("connection reset by peer")));
        self
    }

    pub fn with_broken_catalog(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn completion_count(&self) -> usize {
        self.completions.borrow().len()
    }
}

impl ChatBackend for StubBackend {
    async fn list_models(&self) -> Result<Vec<String>> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail_listing {
            return Err(Error::api_with_status("stub", "unauthorized", 401));
        }
        Ok(self.models.clone())
    }

    async fn complete(&self, model: &str, transcript: &[Message]) -> Result<String> {
        self.completions
            .borrow_mut()
            .push((model.to_string(), transcript.to_vec()));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::http("no scripted reply")))
    }
}
