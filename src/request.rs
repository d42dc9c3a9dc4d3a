//! Turning raw request fields into a [`ConversionRequest`].
//!
//! A network front end hands over three things: the `content-type` header
//! (source format), the `accept` header (destination format) and the query
//! string. This module parses those into [`RequestParams`] and maps failures
//! onto HTTP status codes:
//!
//! | Failure | Class | Status |
//! |---|---|---|
//! | malformed `width` / `height` / `quality` | client | 400 |
//! | unsupported source or destination format | client | 400 |
//! | derived size collapses to zero | client | 400 |
//! | decode or encode failure | server | 500 |
//!
//! ## Query format
//!
//! `width=100&height=50&quality=30`, optionally with a leading `?`. The
//! query is form-urlencoded, so `%31%30` reads as `10` and `+` as a space.
//! Only the three numeric keys are read and the first occurrence of each
//! wins. A missing or empty value means 0 ("unset"). Values are decimal
//! integers with an optional leading `+`; a `-` sign is rejected since
//! sizes and quality cannot be negative. A malformed percent escape is kept
//! literally and then fails integer parsing.

use crate::pipeline::{ConversionError, ConversionRequest, ErrorClass};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid {name} {value:?}: expected a non-negative integer")]
    InvalidInteger { name: &'static str, value: String },
}

/// Parsed request fields, ready to be paired with a byte source and sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub content_type: String,
    pub accept: String,
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

impl RequestParams {
    /// Parse header values and a query string.
    ///
    /// Missing headers become empty strings, which the pipeline later
    /// rejects as unsupported formats.
    pub fn parse(
        content_type: Option<&str>,
        accept: Option<&str>,
        query: &str,
    ) -> Result<Self, ParamError> {
        Ok(Self {
            content_type: content_type.unwrap_or_default().to_string(),
            accept: accept.unwrap_or_default().to_string(),
            width: query_u32(query, "width")?,
            height: query_u32(query, "height")?,
            quality: query_u32(query, "quality")?,
        })
    }

    /// Overlay the numeric fields of `query` onto these params.
    ///
    /// Keys absent from the query leave the current value alone.
    pub fn apply_query(&mut self, query: &str) -> Result<(), ParamError> {
        for (name, field) in [
            ("width", &mut self.width),
            ("height", &mut self.height),
            ("quality", &mut self.quality),
        ] {
            if query_value(query, name).is_some() {
                *field = query_u32(query, name)?;
            }
        }
        Ok(())
    }

    pub fn into_request<R, W>(self, source: R, sink: W) -> ConversionRequest<R, W> {
        ConversionRequest {
            source_format: self.content_type,
            source,
            destination_format: self.accept,
            width: self.width,
            height: self.height,
            quality: self.quality,
            sink,
        }
    }
}

/// First decoded value for `key` in `query`, if the key is present at all.
fn query_value<'q>(query: &'q str, key: &str) -> Option<Cow<'q, str>> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

fn query_u32(query: &str, name: &'static str) -> Result<u32, ParamError> {
    match query_value(query, name) {
        None => Ok(0),
        Some(value) if value.is_empty() => Ok(0),
        Some(value) => parse_u32(name, &value),
    }
}

fn parse_u32(name: &'static str, value: &str) -> Result<u32, ParamError> {
    let invalid = || ParamError::InvalidInteger {
        name,
        value: value.to_string(),
    };
    let digits = value.strip_prefix('+').unwrap_or(value);
    // `u32::from_str` would take a second '+' after the stripped one.
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

impl ErrorClass {
    /// HTTP status code a front end should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::Client => 400,
            ErrorClass::Server => 500,
        }
    }
}

impl ParamError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Client
    }
}

/// Status code for a failed conversion.
pub fn status_for(err: &ConversionError) -> u16 {
    err.class().status_code()
}
