mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use crate::errors::RequestError;

/// Listing filters accepted by `GET /ad/`.
///
/// `price_to` is a lower bound and `price_from` an upper bound. The names are
/// inverted relative to their meaning; clients already depend on it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdFilter {
    pub name: Option<String>,
    pub price_to: Option<i64>,
    pub price_from: Option<i64>,
    pub cat: Option<String>,
    pub locations: Vec<String>,
}

impl AdFilter {
    /// Builds a filter from raw query pairs. `location` may repeat; blank
    /// values are treated as absent.
    pub fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, RequestError> {
        let mut filter = AdFilter::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "name" => filter.name = Some(value),
                "cat" => filter.cat = Some(value),
                "price_to" => filter.price_to = Some(parse_price("price_to", &value)?),
                "price_from" => filter.price_from = Some(parse_price("price_from", &value)?),
                "location" => filter.locations.push(value),
                _ => {}
            }
        }
        Ok(filter)
    }
}

fn parse_price(key: &str, value: &str) -> Result<i64, RequestError> {
    value
        .trim()
        .parse()
        .map_err(|_| RequestError::Validation(format!("{} must be an integer", key)))
}
