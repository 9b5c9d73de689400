//! Categorical codes for survey fields

use std::fmt;

use serde::{Deserialize, Serialize};

/// Code reserved in raw survey files for "missing / not applicable".
pub const MISSING_CODE: i64 = -1;

/// A valid category code of a categorical survey field.
///
/// Missing answers are never represented as a `Category`; they are
/// `Option::<Category>::None` once a column has been decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(i64);

impl Category {
    /// Wrap a raw code as a valid category.
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    /// Decode a raw code, mapping `sentinel` to `None`.
    pub fn from_code(code: i64, sentinel: i64) -> Option<Self> {
        (code != sentinel).then_some(Self(code))
    }

    /// The raw code
    pub const fn code(self) -> i64 {
        self.0
    }
}

impl From<i64> for Category {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
