use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sufficiency of one report category, as judged by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Missing,
    Sufficient,
    /// Any label the backend sends that is neither of the above.
    Unknown,
}

impl ReadinessState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Sufficient => "sufficient",
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for ReadinessState {
    fn from(label: &str) -> Self {
        match label {
            "missing" => Self::Missing,
            "sufficient" => Self::Sufficient,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for ReadinessState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReadinessState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from(label.as_str()))
    }
}

/// Category → state snapshot, kept in the order the backend listed it.
///
/// The category set is defined by the backend and may change between calls,
/// so a snapshot is only ever replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessMap {
    entries: Vec<(String, ReadinessState)>,
}

impl ReadinessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, category: &str) -> Option<ReadinessState> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, state)| *state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ReadinessState)> {
        self.entries.iter().map(|(name, state)| (name.as_str(), *state))
    }
}

impl<K: Into<String>> FromIterator<(K, ReadinessState)> for ReadinessMap {
    fn from_iter<I: IntoIterator<Item = (K, ReadinessState)>>(iter: I) -> Self {
        let mut map = ReadinessMap::new();
        for (category, state) in iter {
            let category = category.into();
            // Last write wins for a repeated key, position of the first is kept.
            match map.entries.iter_mut().find(|(name, _)| *name == category) {
                Some(slot) => slot.1 = state,
                None => map.entries.push((category, state)),
            }
        }
        map
    }
}

impl Serialize for ReadinessMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, state) in &self.entries {
            map.serialize_entry(category, state)?;
        }
        map.end()
    }
}

struct ReadinessMapVisitor;

impl<'de> Visitor<'de> for ReadinessMapVisitor {
    type Value = ReadinessMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of category → readiness label")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(4));
        while let Some((category, state)) = access.next_entry::<String, ReadinessState>()? {
            entries.push((category, state));
        }
        Ok(entries.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for ReadinessMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ReadinessMapVisitor)
    }
}

/// Current readiness of one conversation.
#[derive(Debug, Clone, Default)]
pub struct ReadinessTracker {
    current: ReadinessMap,
}

impl ReadinessTracker {
    pub fn new(initial: ReadinessMap) -> Self {
        Self { current: initial }
    }

    /// Replace the whole snapshot. Categories absent from `map` are dropped.
    pub fn set_all(&mut self, map: ReadinessMap) {
        self.current = map;
    }

    /// True iff every category is `sufficient`. An empty snapshot counts as
    /// sufficient.
    pub fn is_fully_sufficient(&self) -> bool {
        self.current
            .iter()
            .all(|(_, state)| state == ReadinessState::Sufficient)
    }

    /// Categories still `missing`, in backend order. Advisory only.
    pub fn missing_categories(&self) -> Vec<String> {
        self.current
            .iter()
            .filter(|(_, state)| *state == ReadinessState::Missing)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, ReadinessState)> {
        self.current.iter()
    }

    pub fn snapshot(&self) -> &ReadinessMap {
        &self.current
    }
}
