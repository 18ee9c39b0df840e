//! HTTP handlers, one module per resource.

pub mod admin;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;

use common::ParseIdError;

use crate::error::ApiError;

/// Parses a path segment into a typed id.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = ParseIdError>,
{
    Ok(raw.parse()?)
}
