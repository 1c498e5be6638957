//! Test-only async source that records what happens to its cursors.

use std::cell::RefCell;
use std::rc::Rc;

use iterq_core::{Error, Result};

use crate::traits::{AsyncCursor, AsyncSequence};

/// Shared event log: `"<name>:open"`, `"<name>:pull"`, `"<name>:close"`.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &Log, event: &str) -> usize {
    log.borrow().iter().filter(|e| *e == event).count()
}

/// Restartable source over fixed items.
#[derive(Clone)]
pub struct Tracked {
    name: &'static str,
    items: Vec<i32>,
    fail_at: Option<usize>,
    close_fails: bool,
    log: Log,
}

impl Tracked {
    pub fn new(name: &'static str, items: Vec<i32>, log: &Log) -> Self {
        Self {
            name,
            items,
            fail_at: None,
            close_fails: false,
            log: Rc::clone(log),
        }
    }

    /// The pull for position `index` fails with a source error.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn close_fails(mut self) -> Self {
        self.close_fails = true;
        self
    }
}

impl AsyncSequence for Tracked {
    type Item = i32;
    type Cursor = TrackedCursor;

    fn open(&self) -> Result<TrackedCursor> {
        self.log.borrow_mut().push(format!("{}:open", self.name));
        Ok(TrackedCursor {
            source: self.clone(),
            pos: 0,
        })
    }
}

pub struct TrackedCursor {
    source: Tracked,
    pos: usize,
}

impl AsyncCursor for TrackedCursor {
    type Item = i32;

    async fn pull(&mut self) -> Result<Option<i32>> {
        let name = self.source.name;
        self.source.log.borrow_mut().push(format!("{name}:pull"));
        tokio::task::yield_now().await;
        if Some(self.pos) == self.source.fail_at {
            return Err(Error::source(format!("{name} failed at {}", self.pos)));
        }
        let item = self.source.items.get(self.pos).copied();
        self.pos += 1;
        Ok(item)
    }

    fn close(&mut self) -> Result<()> {
        let name = self.source.name;
        self.source.log.borrow_mut().push(format!("{name}:close"));
        if self.source.close_fails {
            return Err(Error::source(format!("{name} close failed")));
        }
        Ok(())
    }
}
