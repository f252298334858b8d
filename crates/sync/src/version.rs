// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-subject logical clocks.
//!
//! Versions order envelopes for one subject. Wall-clock "last updated"
//! comparison is never used for ordering; clock skew across devices makes it
//! unreliable. A version is assigned exactly once per successful write, under
//! the same serialization boundary as the write itself, so two concurrent
//! writers can never draw the same version for one subject.

use crate::envelope::SubjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A monotonic version for a single subject.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Version(u64);

impl Version {
    /// The baseline version for a freshly created subject.
    pub const INITIAL: Self = Self(0);

    /// Creates a version from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the version after this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing versions per subject.
///
/// The clock itself is not thread-safe; the authoritative store holds it
/// inside its own write lock, which is what makes version assignment atomic
/// with the write.
#[derive(Debug, Default)]
pub struct VersionClock {
    current: HashMap<SubjectId, Version>,
}

impl VersionClock {
    /// Creates a clock with no subjects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: HashMap::new(),
        }
    }

    /// Returns the next version for `subject` and advances the clock.
    pub fn next(&mut self, subject: SubjectId) -> Version {
        let entry = self.current.entry(subject).or_insert(Version::INITIAL);
        *entry = entry.next();
        *entry
    }

    /// Returns the last version issued for `subject`, if any.
    #[must_use]
    pub fn last_issued(&self, subject: SubjectId) -> Option<Version> {
        self.current.get(&subject).copied()
    }
}
