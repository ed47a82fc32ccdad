//! Students as loaded from the roster.

use serde::{Deserialize, Serialize};

/// A single student on the roster.
///
/// Immutable once loaded; identity is `id`. `ruby` is the phonetic reading
/// printed under the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub id: u32,
    pub name: String,
    pub ruby: String,
}

impl Student {
    pub fn new(id: u32, name: impl Into<String>, ruby: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ruby: ruby.into(),
        }
    }
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}
