use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Loosely structured version (`1.8.0_51`, `17.0.2+8`, `1.17.1-pre1`).
///
/// Split into numeric and textual items at `.`, `-`, `_`, `+` and at every
/// digit/letter boundary. Numbers compare numerically, trailing zeros are
/// insignificant, and a textual item sorts before the end of the version,
/// so `1.17.1-pre1 < 1.17.1`.
#[derive(Debug, Clone)]
pub struct VersionNumber {
    raw: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Text(String),
}

impl VersionNumber {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let items = tokenize(raw.trim());
        Self { raw, items }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Leading numeric component, `0` when there is none.
    pub fn first_number(&self) -> u64 {
        match self.items.first() {
            Some(Item::Number(n)) => *n,
            _ => 0,
        }
    }

    fn significant(&self) -> &[Item] {
        let end = self
            .items
            .iter()
            .rposition(|item| *item != Item::Number(0))
            .map_or(0, |i| i + 1);
        &self.items[..end]
    }
}

fn tokenize(raw: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut numeric = false;

    for c in raw.chars() {
        if matches!(c, '.' | '-' | '_' | '+' | ' ') {
            flush(&mut current, numeric, &mut items);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != numeric {
            flush(&mut current, numeric, &mut items);
        }
        numeric = is_digit;
        current.push(c);
    }
    flush(&mut current, numeric, &mut items);
    items
}

fn flush(current: &mut String, numeric: bool, items: &mut Vec<Item>) {
    if current.is_empty() {
        return;
    }
    let item = if numeric {
        current
            .parse()
            .map(Item::Number)
            .unwrap_or_else(|_| Item::Text(current.clone()))
    } else {
        Item::Text(current.to_ascii_lowercase())
    };
    items.push(item);
    current.clear();
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.significant();
        let right = other.significant();
        for i in 0..left.len().max(right.len()) {
            let ordering = match (left.get(i), right.get(i)) {
                (Some(Item::Number(a)), Some(Item::Number(b))) => a.cmp(b),
                (Some(Item::Text(a)), Some(Item::Text(b))) => a.cmp(b),
                (Some(Item::Number(_)), Some(Item::Text(_))) => Ordering::Greater,
                (Some(Item::Text(_)), Some(Item::Number(_))) => Ordering::Less,
                // `1.8` < `1.8.0_51`, but `1.17.1-pre1` < `1.17.1`
                (Some(Item::Number(_)), None) => Ordering::Greater,
                (Some(Item::Text(_)), None) => Ordering::Less,
                (None, Some(Item::Number(_))) => Ordering::Less,
                (None, Some(Item::Text(_))) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionNumber {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for VersionNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
