//! Search filters and their query-string encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything that can be turned into a URL query string (without the `?`)
pub trait QueryEncoder {
    fn encode(&self) -> String;
}

/// Ordered set of listing filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    params: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter, replacing any previous value for the same key
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn make(self, make: &str) -> Self {
        self.param("make", make)
    }

    pub fn model(self, model: &str) -> Self {
        self.param("model", model)
    }

    pub fn price_from(self, chf: u32) -> Self {
        self.param("priceFrom", chf)
    }

    pub fn price_to(self, chf: u32) -> Self {
        self.param("priceTo", chf)
    }

    pub fn year_from(self, year: u16) -> Self {
        self.param("yearFrom", year)
    }

    pub fn year_to(self, year: u16) -> Self {
        self.param("yearTo", year)
    }

    pub fn mileage_from(self, km: u32) -> Self {
        self.param("mileageFrom", km)
    }

    pub fn mileage_to(self, km: u32) -> Self {
        self.param("mileageTo", km)
    }

    pub fn sort(self, sort: &str) -> Self {
        self.param("sort", sort)
    }

    pub fn page(self, page: u32) -> Self {
        self.param("page", page)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl QueryEncoder for SearchQuery {
    fn encode(&self) -> String {
        encode_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> QueryEncoder for [(K, V)] {
    fn encode(&self) -> String {
        encode_pairs(self.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
    }
}

impl QueryEncoder for BTreeMap<String, String> {
    fn encode(&self) -> String {
        encode_pairs(self.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// A query string that is already encoded
impl QueryEncoder for str {
    fn encode(&self) -> String {
        self.trim_start_matches('?').to_string()
    }
}

impl<T: QueryEncoder + ?Sized> QueryEncoder for &T {
    fn encode(&self) -> String {
        (**self).encode()
    }
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_encodes_in_insertion_order() {
        let query = SearchQuery::new()
            .make("bmw")
            .price_to(20000)
            .year_from(2018)
            .page(2);
        assert_eq!(query.encode(), "make=bmw&priceTo=20000&yearFrom=2018&page=2");
    }

    #[test]
    fn test_param_replaces_existing_value() {
        let query = SearchQuery::new().page(1).make("audi").page(3);
        assert_eq!(query.get("page"), Some("3"));
        assert_eq!(query.encode(), "page=3&make=audi");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = SearchQuery::new().model("Série 3 & co");
        assert_eq!(query.encode(), "model=S%C3%A9rie%203%20%26%20co");
    }

    #[test]
    fn test_slice_and_raw_encoders() {
        let pairs = [("make", "vw"), ("model", "golf")];
        assert_eq!(pairs[..].encode(), "make=vw&model=golf");
        assert_eq!("?make=vw".encode(), "make=vw");
        assert_eq!(SearchQuery::new().encode(), "");
    }
}
