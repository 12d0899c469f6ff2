use crate::stream::Value;

// -----------------------------------------------------------------------------
// SideChannel

/// Operational members diverted out of a decoded document.
///
/// Each entry keeps the scalar value of the member. Members whose value was
/// null, an array or an object are recorded without a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideChannel {
    entries: Vec<(String, Option<Value>)>,
}

impl SideChannel {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records a member, replacing an earlier entry with the same name.
    pub fn insert(&mut self, name: String, value: Option<Value>) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the entry for `name`: `None` if absent, `Some(None)` if recorded without a value.
    pub fn get(&self, name: &str) -> Option<Option<&Value>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_ref())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
