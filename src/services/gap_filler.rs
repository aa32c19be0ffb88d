//! Gap Filling
//!
//! Expands an ascending kline series so that every missing grid minute between
//! two observed klines gets a placeholder row. Placeholders carry the missing
//! sentinel in every numeric column and `interpolated = true`; observed klines
//! are copied through with `interpolated = false`.
//!
//! The input must be sorted ascending with unique open times. That is checked
//! upstream by preprocessing and not repeated here.

use crate::models::{Kline, KlineRow};

/// Lazy gap-filling adaptor over an ascending kline iterator
///
/// Holds at most one pending kline, so the expansion streams in constant
/// memory regardless of series length.
pub struct GapFill<I> {
    inner: I,
    step_ms: i64,
    /// Open time of the last emitted row
    cursor: Option<i64>,
    /// Kline waiting behind the placeholders being emitted for its gap
    pending: Option<Kline>,
}

impl<I> GapFill<I>
where
    I: Iterator<Item = Kline>,
{
    pub fn new(inner: I, step_ms: i64) -> Self {
        Self {
            inner,
            step_ms,
            cursor: None,
            pending: None,
        }
    }
}

impl<I> Iterator for GapFill<I>
where
    I: Iterator<Item = Kline>,
{
    type Item = KlineRow;

    fn next(&mut self) -> Option<KlineRow> {
        let kline = match self.pending.take() {
            Some(kline) => kline,
            None => self.inner.next()?,
        };

        // Starting one step before the first kline means nothing is ever
        // emitted ahead of it.
        let cursor = self
            .cursor
            .unwrap_or_else(|| kline.open_time.saturating_sub(self.step_ms));
        let expected = cursor.saturating_add(self.step_ms);

        if expected < kline.open_time {
            self.pending = Some(kline);
            self.cursor = Some(expected);
            Some(KlineRow::blank(expected))
        } else {
            self.cursor = Some(kline.open_time);
            Some(KlineRow::observed(kline))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, _) = self.inner.size_hint();
        let pending = usize::from(self.pending.is_some());
        (lower.saturating_add(pending), None)
    }
}

/// Fixed-capacity row buffer, handed off whole and reset when full
#[derive(Debug)]
pub struct ChunkBuffer {
    rows: Vec<KlineRow>,
    capacity: usize,
}

impl ChunkBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a row; returns the full chunk once capacity is reached
    pub fn push(&mut self, row: KlineRow) -> Option<Vec<KlineRow>> {
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            Some(self.take())
        } else {
            None
        }
    }

    /// Hand off whatever is left, `None` if the buffer is empty
    pub fn finish(&mut self) -> Option<Vec<KlineRow>> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn take(&mut self) -> Vec<KlineRow> {
        std::mem::replace(&mut self.rows, Vec::with_capacity(self.capacity))
    }
}

/// Gap filler for a fixed grid step
#[derive(Debug, Clone, Copy)]
pub struct GapFiller {
    step_ms: i64,
    chunk_size: Option<usize>,
}

impl GapFiller {
    pub fn new(step_ms: i64) -> Self {
        Self {
            step_ms,
            chunk_size: None,
        }
    }

    /// Emit filled rows in batches of `chunk_size` (`None` disables chunking)
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Lazily expand `klines`
    pub fn iter<I>(&self, klines: I) -> GapFill<I::IntoIter>
    where
        I: IntoIterator<Item = Kline>,
    {
        GapFill::new(klines.into_iter(), self.step_ms)
    }

    /// Expand `klines` into a new owned series
    pub fn fill(&self, klines: Vec<Kline>) -> Vec<KlineRow> {
        match self.chunk_size {
            None => self.iter(klines).collect(),
            Some(chunk_size) => {
                let mut filled = Vec::with_capacity(klines.len());
                let sink = |chunk: Vec<KlineRow>| -> Result<(), std::convert::Infallible> {
                    filled.extend(chunk);
                    Ok(())
                };
                match self.fill_chunked(klines, chunk_size, sink) {
                    Ok(_) => filled,
                    Err(never) => match never {},
                }
            }
        }
    }

    /// Expand `klines`, passing each completed batch of `chunk_size` rows to
    /// `sink`. Returns the number of rows emitted.
    ///
    /// Peak memory is one batch plus whatever `sink` retains.
    pub fn fill_chunked<I, F, E>(&self, klines: I, chunk_size: usize, mut sink: F) -> Result<usize, E>
    where
        I: IntoIterator<Item = Kline>,
        F: FnMut(Vec<KlineRow>) -> Result<(), E>,
    {
        let mut buffer = ChunkBuffer::new(chunk_size);
        let mut emitted = 0;

        for row in self.iter(klines) {
            emitted += 1;
            if let Some(chunk) = buffer.push(row) {
                sink(chunk)?;
            }
        }

        if let Some(chunk) = buffer.finish() {
            sink(chunk)?;
        }

        Ok(emitted)
    }
}
