//! Phase identifiers.

use std::fmt;

/// A named state inside an activity's state machine.
///
/// Phases are interned `&'static str` names declared as `const` items next to
/// the activity that owns them, so they can be used directly as `match`
/// patterns. Two phases are equal iff their names are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phase(&'static str);

impl Phase {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
