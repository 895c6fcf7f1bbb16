//! Class name table.

use crate::util::{DecodeError, DecodeResult};

/// Ordered class names; index is the class id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassTable {
    names: Vec<String>,
}

impl ClassTable {
    /// Builds a table from names in class-id order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses one name per line; surrounding whitespace and blank lines are
    /// ignored.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true for an empty table.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`, if any.
    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// Name of `class_id`, or `ClassIndexOutOfRange`.
    pub fn name(&self, class_id: usize) -> DecodeResult<&str> {
        self.get(class_id).ok_or(DecodeError::ClassIndexOutOfRange {
            class_id,
            len: self.names.len(),
        })
    }

    /// All names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
