//! Object identifiers.
//!
//! Ids are written into the saved scene value and come back when it is
//! loaded, possibly in a later session. Every id the process has seen,
//! loaded or minted, sits in one interner, so minting a fresh id is a matter
//! of skipping names the interner already knows.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static KNOWN_IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Handle to a canvas object. Serialized as its plain name (`rect_12`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectId(Spur);

impl ObjectId {
    /// The id named `name`, recording it as taken.
    pub fn intern(name: &str) -> Self {
        Self(KNOWN_IDS.get_or_intern(name))
    }

    /// The id named `name` if anything has used it yet.
    pub fn lookup(name: &str) -> Option<Self> {
        KNOWN_IDS.get(name).map(Self)
    }

    pub fn as_str(&self) -> &str {
        KNOWN_IDS.resolve(&self.0)
    }

    /// Mint `{kind}_{n}`, skipping every name already in use, including ids
    /// read from earlier saved scenes.
    pub fn with_prefix(kind: &str) -> Self {
        loop {
            let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
            let name = format!("{kind}_{serial}");
            if Self::lookup(&name).is_none() {
                return Self::intern(&name);
            }
        }
    }
}

impl From<String> for ObjectId {
    fn from(name: String) -> Self {
        Self(KNOWN_IDS.get_or_intern(name))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
