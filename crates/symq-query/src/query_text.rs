//! Growable buffer for generated SQL.
//!
//! Starts small and doubles on demand up to a hard cap. An append that would
//! cross the cap fails with [`QueryError::TooLarge`] and leaves the buffer
//! untouched, so a caller never executes truncated SQL.

use std::fmt;

use crate::error::QueryError;

/// Initial reservation.
pub const INITIAL_CAPACITY: usize = 4 * 1024;

/// Hard cap on generated query text.
pub const MAX_CAPACITY: usize = 32 * 1024 * 1024;

/// Query text under construction.
#[derive(Debug, Clone)]
pub struct QueryText {
    buf: String,
    capacity: usize,
    limit: usize,
}

impl Default for QueryText {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryText {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_CAPACITY)
    }

    /// Buffer with a custom cap.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        let capacity = INITIAL_CAPACITY.min(limit);
        Self {
            buf: String::with_capacity(capacity),
            capacity,
            limit,
        }
    }

    /// Append a literal fragment.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the result would exceed the cap.
    pub fn push(&mut self, fragment: &str) -> Result<(), QueryError> {
        let needed = self.buf.len() + fragment.len();
        if needed > self.limit {
            return Err(QueryError::TooLarge { limit: self.limit });
        }
        if needed > self.capacity {
            let mut grown = self.capacity.max(1);
            while grown < needed {
                grown = grown.saturating_mul(2);
            }
            let grown = grown.min(self.limit);
            self.buf.reserve(grown - self.buf.len());
            self.capacity = grown;
        }
        self.buf.push_str(fragment);
        Ok(())
    }

    /// Append formatted text, e.g. `text.push_fmt(format_args!("LIMIT {n}"))`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the result would exceed the cap.
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), QueryError> {
        match args.as_str() {
            Some(literal) => self.push(literal),
            None => self.push(&args.to_string()),
        }
    }

    /// Append `items` separated by `sep`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the result would exceed the cap.
    pub fn push_joined<S: AsRef<str>>(&mut self, items: &[S], sep: &str) -> Result<(), QueryError> {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.push(sep)?;
            }
            self.push(item.as_ref())?;
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Logical capacity (tracks the doubling schedule, not the allocator's).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Display for QueryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}
