//! List Filters
//!
//! Filter state shared by the list views, its URL query form, and the
//! debounce applied to free-text input.

use std::collections::BTreeMap;
use std::time::Duration;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use phrasebank_lib::domain::{CategoryLevel, CategoryPath, Difficulty, MaterialType};
use phrasebank_lib::repository::MaterialQuery;
use tokio::time::Instant;

/// Characters escaped in query values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub material_type: Option<MaterialType>,
    pub difficulty: Option<Difficulty>,
    pub path: CategoryPath,
    /// Free text, applied to fetched rows only
    pub q: String,
}

impl FilterState {
    /// Server-side part of the filter; free text is not included
    pub fn to_query(&self, limit: u32) -> MaterialQuery {
        MaterialQuery {
            material_type: self.material_type,
            difficulty: self.difficulty,
            path: self.path,
            cursor: None,
            limit,
        }
    }

    /// Same server-side filter (free text ignored)
    pub fn same_scope(&self, other: &FilterState) -> bool {
        self.material_type == other.material_type
            && self.difficulty == other.difficulty
            && self.path == other.path
    }

    /// Canonical query string: keys sorted, empty values omitted
    pub fn to_query_string(&self) -> String {
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        if let Some(t) = self.material_type {
            params.insert("type", t.as_str().to_string());
        }
        if let Some(d) = self.difficulty {
            params.insert("D", d.as_str().to_string());
        }
        for (key, level) in [("L", CategoryLevel::Large), ("M", CategoryLevel::Medium), ("S", CategoryLevel::Small)] {
            if let Some(id) = self.path.get(level) {
                params.insert(key, id.to_string());
            }
        }
        if !self.q.trim().is_empty() {
            params.insert("q", self.q.clone());
        }
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse `type`, `D`, `L`, `M`, `S`, `q`. Unknown keys and invalid values are ignored.
    pub fn from_query_string(query: &str) -> Self {
        let mut state = FilterState::default();
        let mut ids: [Option<u32>; 3] = [None; 3];
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode_str(&raw.replace('+', " ")).decode_utf8_lossy().to_string();
            match key {
                "type" => state.material_type = MaterialType::parse(&value).ok(),
                "D" => state.difficulty = Difficulty::parse(&value).ok(),
                "L" => ids[0] = value.parse().ok(),
                "M" => ids[1] = value.parse().ok(),
                "S" => ids[2] = value.parse().ok(),
                "q" => state.q = value,
                _ => {}
            }
        }
        state.path = CategoryPath::new(ids[0], ids[1], ids[2]);
        state
    }
}

/// Two-way URL binding without update loops: a change is applied only when
/// its canonical form differs from the last one applied in either direction.
#[derive(Debug, Clone, Default)]
pub struct UrlSync {
    last_applied: Option<String>,
}

impl UrlSync {
    /// URL changed: returns the filter to apply, or None if it is the one already applied
    pub fn from_url(&mut self, query: &str) -> Option<FilterState> {
        let state = FilterState::from_query_string(query);
        let canonical = state.to_query_string();
        if self.last_applied.as_deref() == Some(canonical.as_str()) {
            return None;
        }
        self.last_applied = Some(canonical);
        Some(state)
    }

    /// Filter changed: returns the query string to write, or None if the URL already shows it
    pub fn to_url(&mut self, state: &FilterState) -> Option<String> {
        let canonical = state.to_query_string();
        if self.last_applied.as_deref() == Some(canonical.as_str()) {
            return None;
        }
        self.last_applied = Some(canonical.clone());
        Some(canonical)
    }
}

/// Latest value wins once it has been quiet for `delay`
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period
    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// The pending value, once its deadline has passed
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(&self.pending, Some((_, deadline)) if *deadline <= now);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_is_canonical() {
        let state = FilterState {
            material_type: Some(MaterialType::Sentence),
            difficulty: Some(Difficulty::A),
            path: CategoryPath::new(Some(3), Some(7), None),
            q: "have been".into(),
        };
        assert_eq!(state.to_query_string(), "D=A&L=3&M=7&q=have%20been&type=sentence");
        assert_eq!(FilterState::from_query_string(&state.to_query_string()), state);
        // Order of keys does not matter
        assert_eq!(
            FilterState::from_query_string("?type=sentence&q=have+been&M=7&L=3&D=A"),
            state
        );
    }

    #[test]
    fn test_invalid_values_are_dropped() {
        let state = FilterState::from_query_string("type=poem&L=abc&S=5&x=1");
        assert_eq!(state.material_type, None);
        assert_eq!(state.path, CategoryPath::new(None, None, Some(5)));
        assert_eq!(FilterState::default().to_query_string(), "");
    }

    #[test]
    fn test_url_sync_breaks_loops() {
        let mut sync = UrlSync::default();
        let applied = sync.from_url("L=1&type=sentence").unwrap();
        // Writing back the state we just read is a no-op
        assert_eq!(sync.to_url(&applied), None);
        // Same URL in another key order is a no-op as well
        assert!(sync.from_url("type=sentence&L=1").is_none());

        let mut changed = applied.clone();
        changed.difficulty = Some(Difficulty::C);
        assert_eq!(sync.to_url(&changed).as_deref(), Some("D=C&L=1&type=sentence"));
        assert!(sync.from_url("D=C&L=1&type=sentence").is_none());
    }

    #[test]
    fn test_debounce_keeps_latest() {
        let start = Instant::now();
        let mut debounced = Debounced::new(Duration::from_millis(300));
        debounced.set("ha", start);
        debounced.set("have", start + Duration::from_millis(100));
        assert_eq!(debounced.take_ready(start + Duration::from_millis(350)), None);
        assert_eq!(debounced.take_ready(start + Duration::from_millis(400)), Some("have"));
        assert!(!debounced.is_pending());
    }
}
