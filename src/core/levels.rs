//! Level registry: named severities and their numeric priorities
//!
//! Lower numbers are more severe. A record at level `L` passes a threshold `T`
//! when `priority(T) >= priority(L)`.

use super::error::{LoggerError, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered table of level names and priorities.
///
/// The table is replaced wholesale on reconfiguration; there is no way to patch
/// a single entry in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels {
    entries: Vec<(String, u32)>,
}

impl Levels {
    /// Build a registry from `(name, priority)` pairs.
    ///
    /// Later pairs with an already-seen name replace the earlier priority.
    /// Duplicate priorities are allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use logfan::Levels;
    ///
    /// let levels = Levels::new([("loud", 0), ("quiet", 1)]).unwrap();
    /// assert_eq!(levels.priority_of("quiet"), Some(1));
    /// assert!(Levels::new(Vec::<(&str, u32)>::new()).is_err());
    /// ```
    pub fn new<I, S>(levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, u32)> = Vec::new();
        for (name, priority) in levels {
            let name = name.into();
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = priority,
                None => entries.push((name, priority)),
            }
        }

        if entries.is_empty() {
            return Err(LoggerError::config("Levels", "at least one level is required"));
        }

        Ok(Self { entries })
    }

    /// npm-style levels, the default registry
    pub fn npm() -> Self {
        Self::from_static(&[
            ("error", 0),
            ("warn", 1),
            ("info", 2),
            ("http", 3),
            ("verbose", 4),
            ("debug", 5),
            ("silly", 6),
        ])
    }

    /// RFC 5424 syslog levels
    pub fn syslog() -> Self {
        Self::from_static(&[
            ("emerg", 0),
            ("alert", 1),
            ("crit", 2),
            ("error", 3),
            ("warning", 4),
            ("notice", 5),
            ("info", 6),
            ("debug", 7),
        ])
    }

    /// Levels tuned for command line tools
    pub fn cli() -> Self {
        Self::from_static(&[
            ("error", 0),
            ("warn", 1),
            ("help", 2),
            ("data", 3),
            ("info", 4),
            ("debug", 5),
            ("prompt", 6),
            ("verbose", 7),
            ("input", 8),
            ("silly", 9),
        ])
    }

    fn from_static(table: &[(&str, u32)]) -> Self {
        Self {
            entries: table
                .iter()
                .map(|(name, priority)| ((*name).to_string(), *priority))
                .collect(),
        }
    }

    /// Priority of `name`, or `None` when the name is unknown
    pub fn priority_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, priority)| *priority)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.priority_of(name).is_some()
    }

    /// Level names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, priority)| (name.as_str(), *priority))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delivery check used on the write path.
    ///
    /// Unknown names on either side are treated permissively: the record is
    /// accepted.
    pub fn accepts(&self, threshold: &str, level: &str) -> bool {
        match (self.priority_of(threshold), self.priority_of(level)) {
            (Some(threshold), Some(level)) => threshold >= level,
            _ => true,
        }
    }

    /// Pure "would anyone accept this level" query.
    ///
    /// With no bindings the engine threshold decides. Otherwise the level is
    /// enabled when at least one binding's effective threshold (its own
    /// override, else `threshold`) accepts it. Unknown names are disabled.
    pub fn is_enabled_for<'a, I>(&self, level: &str, threshold: &str, overrides: I) -> bool
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let Some(given) = self.priority_of(level) else {
            return false;
        };
        let Some(configured) = self.priority_of(threshold) else {
            return false;
        };

        let mut overrides = overrides.into_iter().peekable();
        if overrides.peek().is_none() {
            return configured >= given;
        }

        overrides.any(|own| {
            let effective = own
                .and_then(|name| self.priority_of(name))
                .unwrap_or(configured);
            effective >= given
        })
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self::npm()
    }
}

impl fmt::Display for Levels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(name, priority)| format!("{}={}", name, priority))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl Serialize for Levels {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, priority) in &self.entries {
            map.serialize_entry(name, priority)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Levels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let table = BTreeMap::<String, u32>::deserialize(deserializer)?;
        let mut entries: Vec<(String, u32)> = table.into_iter().collect();
        entries.sort_by_key(|(_, priority)| *priority);
        Levels::new(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_priorities() {
        let levels = Levels::npm();
        assert_eq!(levels.priority_of("error"), Some(0));
        assert_eq!(levels.priority_of("silly"), Some(6));
        assert_eq!(levels.priority_of("trace"), None);
        assert_eq!(levels.len(), 7);
    }

    #[test]
    fn test_duplicate_name_replaces_priority() {
        let levels = Levels::new([("a", 0), ("b", 1), ("a", 5)]).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels.priority_of("a"), Some(5));
        assert_eq!(levels.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_levels_rejected() {
        let err = Levels::new(Vec::<(String, u32)>::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_accepts_threshold() {
        let levels = Levels::npm();
        assert!(levels.accepts("info", "error"));
        assert!(levels.accepts("info", "info"));
        assert!(!levels.accepts("info", "debug"));
        // permissive on unknown names
        assert!(levels.accepts("info", "trace"));
        assert!(levels.accepts("nope", "debug"));
    }

    #[test]
    fn test_is_enabled_without_bindings() {
        let levels = Levels::npm();
        assert!(levels.is_enabled_for("warn", "info", std::iter::empty()));
        assert!(!levels.is_enabled_for("debug", "info", std::iter::empty()));
        assert!(!levels.is_enabled_for("trace", "info", std::iter::empty()));
        assert!(!levels.is_enabled_for("info", "nope", std::iter::empty()));
    }

    #[test]
    fn test_is_enabled_with_bindings() {
        let levels = Levels::npm();
        // one binding at error, one inheriting info
        assert!(levels.is_enabled_for("warn", "info", [Some("error"), None]));
        // all bindings at error
        assert!(!levels.is_enabled_for("warn", "info", [Some("error"), Some("error")]));
        // a verbose binding opens debug even though the engine is at info
        assert!(levels.is_enabled_for("debug", "info", [Some("silly")]));
        // unknown override falls back to the engine threshold
        assert!(levels.is_enabled_for("info", "info", [Some("bogus")]));
    }

    #[test]
    fn test_serde_roundtrip_orders_by_priority() {
        let levels: Levels = serde_json::from_str(r#"{"low":2,"high":0,"mid":1}"#).unwrap();
        assert_eq!(levels.names().collect::<Vec<_>>(), vec!["high", "mid", "low"]);

        let json = serde_json::to_string(&levels).unwrap();
        assert_eq!(json, r#"{"high":0,"mid":1,"low":2}"#);
    }

    #[test]
    fn test_display() {
        let levels = Levels::new([("a", 0), ("b", 1)]).unwrap();
        assert_eq!(levels.to_string(), "a=0,b=1");
    }
}
