//! Shared helpers: a restartable integer source that records how often it was
//! opened, pulled and closed, and optionally the order of those events.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use iterq_core::{Error, Result};
use iterq_operators::{Cursor, Sequence};

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: Cell<usize>,
    pub pulls: Cell<usize>,
    pub closes: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

/// Ordered `"<name>:open"` / `"<name>:pull"` / `"<name>:close"` events shared
/// by several sources.
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Yields `0..len`; fails with a source error when it reaches `fail_at`.
#[derive(Clone)]
pub struct CountedSource {
    len: i64,
    fail_at: Option<i64>,
    close_fails: bool,
    events: Option<(&'static str, EventLog)>,
    counters: Rc<Counters>,
}

impl CountedSource {
    pub fn new(len: i64) -> Self {
        Self {
            len,
            fail_at: None,
            close_fails: false,
            events: None,
            counters: Rc::new(Counters::default()),
        }
    }

    /// Like [`CountedSource::new`], also appending to `log`.
    pub fn logged(name: &'static str, len: i64, log: &EventLog) -> Self {
        Self {
            events: Some((name, Rc::clone(log))),
            ..Self::new(len)
        }
    }

    /// `close` reports a source error after counting the call.
    pub fn close_fails(mut self) -> Self {
        self.close_fails = true;
        self
    }

    pub fn failing_at(len: i64, fail_at: i64) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..Self::new(len)
        }
    }

    pub fn counters(&self) -> Rc<Counters> {
        Rc::clone(&self.counters)
    }
}

impl Sequence for CountedSource {
    type Item = i64;
    type Cursor = CountedCursor;

    fn open(&self) -> Result<CountedCursor> {
        bump(&self.counters.opens);
        record(&self.events, "open");
        Ok(CountedCursor {
            next: 0,
            len: self.len,
            fail_at: self.fail_at,
            close_fails: self.close_fails,
            events: self.events.clone(),
            counters: Rc::clone(&self.counters),
        })
    }
}

pub struct CountedCursor {
    next: i64,
    len: i64,
    fail_at: Option<i64>,
    close_fails: bool,
    events: Option<(&'static str, EventLog)>,
    counters: Rc<Counters>,
}

fn record(events: &Option<(&'static str, EventLog)>, what: &str) {
    if let Some((name, log)) = events {
        log.borrow_mut().push(format!("{name}:{what}"));
    }
}

impl Cursor for CountedCursor {
    type Item = i64;

    fn pull(&mut self) -> Result<Option<i64>> {
        bump(&self.counters.pulls);
        record(&self.events, "pull");
        if Some(self.next) == self.fail_at {
            return Err(Error::source(format!("failed at {}", self.next)));
        }
        if self.next >= self.len {
            return Ok(None);
        }
        self.next += 1;
        Ok(Some(self.next - 1))
    }

    fn close(&mut self) -> Result<()> {
        bump(&self.counters.closes);
        record(&self.events, "close");
        if self.close_fails {
            return Err(Error::source("close failed"));
        }
        Ok(())
    }
}
