//! Fixed-size paging.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::{Error, Result};

use crate::cursor::Upstream;
use crate::metrics;
use crate::source::ArrayCursor;
use crate::traits::{Cursor, Sequence};

/// One page: its index, the offset of its first element and the elements.
/// Itself a restartable sequence carrying the source hierarchy.
pub struct Page<T> {
    page: usize,
    offset: usize,
    elements: Arc<[T]>,
    hierarchy: Option<Hierarchy<T>>,
}

impl<T> Page<T> {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> Clone for Page<T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page,
            offset: self.offset,
            elements: Arc::clone(&self.elements),
            hierarchy: self.hierarchy.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("page", &self.page)
            .field("offset", &self.offset)
            .field("elements", &self.elements)
            .finish()
    }
}

impl<T: Clone> Sequence for Page<T> {
    type Item = T;
    type Cursor = ArrayCursor<T>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ArrayCursor::new(Arc::clone(&self.elements)))
    }

    fn hierarchy(&self) -> Option<Hierarchy<T>> {
        self.hierarchy.clone()
    }
}

/// Splits the upstream into pages of `size` elements; the last page may be
/// shorter. Pages are produced lazily, one upstream run at a time.
pub struct PageBy<S> {
    source: S,
    size: usize,
}

impl<S> PageBy<S> {
    /// Fails with a RangeKind error for a zero page size.
    pub fn new(source: S, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::out_of_range(
                "pageSize",
                "Positive non-zero number expected",
            ));
        }
        Ok(Self { source, size })
    }
}

impl<S: Sequence> Sequence for PageBy<S> {
    type Item = Page<S::Item>;
    type Cursor = PageByCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(PageByCursor {
            upstream: Upstream::new(self.source.open()?),
            size: self.size,
            page: 0,
            hierarchy: self.source.hierarchy(),
        })
    }
}

pub struct PageByCursor<C: Cursor> {
    upstream: Upstream<C>,
    size: usize,
    page: usize,
    hierarchy: Option<Hierarchy<C::Item>>,
}

impl<C: Cursor> Cursor for PageByCursor<C> {
    type Item = Page<C::Item>;

    fn pull(&mut self) -> Result<Option<Page<C::Item>>> {
        let mut elements = Vec::with_capacity(self.size.min(1024));
        while elements.len() < self.size {
            match self.upstream.pull()? {
                Some(item) => elements.push(item),
                None => break,
            }
        }
        if elements.is_empty() {
            return Ok(None);
        }
        let page = Page {
            page: self.page,
            offset: self.page * self.size,
            elements: elements.into(),
            hierarchy: self.hierarchy.clone(),
        };
        self.page += 1;
        Ok(Some(page))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("page_by");
        self.upstream.close()
    }
}
