use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use ulid::{Generator, Ulid};

thread_local! {
    static ULID_GENERATOR: RefCell<Generator> = RefCell::new(Generator::new());
}

/// Order ID
///
/// A ULID rendered as its 26-character Crockford base32 string. Ids sort
/// lexicographically by creation time; ids minted on the same thread within
/// the same millisecond still sort in creation order, unless the generator
/// overflows in that millisecond.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, time-sortable id.
    pub fn generate() -> Self {
        // The monotonic generator only fails once the random part overflows
        // within a single millisecond. The fallback id is still unique but may
        // sort before ids already minted in that millisecond.
        let ulid = ULID_GENERATOR.with(|generator| {
            generator.borrow_mut().generate().unwrap_or_else(|err| {
                tracing::debug!(%err, "monotonic ulid overflow, ordering not guaranteed");
                Ulid::new()
            })
        });
        Self(ulid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A position is identified by the id of the order that opened it.
pub type PositionId = OrderId;
