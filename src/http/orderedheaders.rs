use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// A header map that strictly preserves insertion order.
///
/// Keys are unique under case-insensitive comparison; the name is kept with
/// the casing the caller supplied so it can be reported back unchanged.
#[derive(Debug, Clone, Default)]
pub struct OrderedHeaderMap {
    headers: Vec<(String, HeaderName, HeaderValue)>,
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self { headers: Vec::new() }
    }

    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let name_header = HeaderName::from_str(name).map_err(|_| NetError::InvalidHeader)?;
        let value_header = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;

        // Update in place if exists (case-insensitive key match), else append.
        if let Some(entry) = self.headers.iter_mut().find(|(_, n, _)| *n == name_header) {
            entry.0 = name.to_string();
            entry.2 = value_header;
        } else {
            self.headers.push((name.to_string(), name_header, value_header));
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        if let Ok(target) = HeaderName::from_str(name) {
            self.headers.retain(|(_, n, _)| *n != target);
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers.iter().find(|(_, n, _)| *n == target).map(|(_, _, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Headers in insertion order, with names as supplied.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.headers.iter().map(|(original, _, v)| (original.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Consumes the map and returns a standard http::HeaderMap.
    ///
    /// `HeaderMap` makes no ordering promise across names, so the result may
    /// not iterate in the order `iter()` reports.
    pub fn to_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (_, name, value) in self.headers {
            map.append(name, value);
        }
        map
    }
}
