//! The attribute-bundle boundary: recognized keys and loosely-typed values.
//!
//! A binding layer hands cookie attributes over as `(key, value)` pairs.
//! Keys come from the closed [`AttrKey`] enumeration; anything outside it
//! is rejected by name. Values travel as the [`AttrValue`] tagged union
//! and are coerced into the shape the target attribute expects.

use time::OffsetDateTime;

use crate::cookie::expires::ExpiresInput;
use crate::cookie::values::{Stringify, ValuesInput};
use crate::errors::CookieError;

/// The closed set of attribute keys a bundle may carry.
///
/// `value` routes into the values setter; every other key maps onto the
/// accessor of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKey {
    Name,
    Value,
    Expires,
    Domain,
    Path,
    Secure,
}

impl AttrKey {
    /// Maps a bundle key onto the enumeration. Unknown keys are an error
    /// naming the offender.
    pub fn parse(key: &str) -> Result<AttrKey, CookieError> {
        match key {
            "name" => Ok(AttrKey::Name),
            "value" => Ok(AttrKey::Value),
            "expires" => Ok(AttrKey::Expires),
            "domain" => Ok(AttrKey::Domain),
            "path" => Ok(AttrKey::Path),
            "secure" => Ok(AttrKey::Secure),
            other => Err(CookieError::UnknownAttribute(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKey::Name => "name",
            AttrKey::Value => "value",
            AttrKey::Expires => "expires",
            AttrKey::Domain => "domain",
            AttrKey::Path => "path",
            AttrKey::Secure => "secure",
        }
    }
}

/// A loosely-typed attribute value, as a binding layer would hand it in.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    List(Vec<String>),
    Int(i64),
    Bool(bool),
    Time(OffsetDateTime),
}

impl AttrValue {
    /// Truthiness for the secure flag: false, zero, empty strings and
    /// empty lists are falsy; everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Str(s) => !s.is_empty(),
            AttrValue::List(v) => !v.is_empty(),
            AttrValue::Time(_) => true,
        }
    }

    /// Coerces into the text stored by name, domain and path.
    pub(crate) fn into_text(self, attr: &'static str) -> Result<String, CookieError> {
        match self {
            AttrValue::Str(s) => Ok(s),
            AttrValue::Int(i) => Ok(i.to_string()),
            AttrValue::Bool(b) => Ok(b.to_string()),
            AttrValue::List(_) | AttrValue::Time(_) => Err(CookieError::WrongValueType {
                attr,
                expected: "a string-coercible value",
            }),
        }
    }

    /// Coerces into a values assignment.
    pub(crate) fn into_values_input(self, attr: &'static str) -> Result<ValuesInput, CookieError> {
        match self {
            AttrValue::Str(s) => Ok(ValuesInput::Single(s)),
            AttrValue::List(values) => Ok(ValuesInput::Many(values)),
            AttrValue::Int(i) => Ok(ValuesInput::Single(i.to_string())),
            AttrValue::Bool(b) => Ok(ValuesInput::Single(b.to_string())),
            AttrValue::Time(_) => Err(CookieError::WrongValueType {
                attr,
                expected: "a value or a collection of values",
            }),
        }
    }

    /// Coerces into an expiration assignment.
    pub(crate) fn into_expires_input(self, attr: &'static str) -> Result<ExpiresInput, CookieError> {
        match self {
            AttrValue::Time(at) => Ok(ExpiresInput::Absolute(at)),
            AttrValue::Str(raw) => Ok(ExpiresInput::Raw(raw)),
            AttrValue::List(_) | AttrValue::Int(_) | AttrValue::Bool(_) => {
                Err(CookieError::WrongValueType {
                    attr,
                    expected: "an absolute time or an expiration string",
                })
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<OffsetDateTime> for AttrValue {
    fn from(at: OffsetDateTime) -> Self {
        AttrValue::Time(at)
    }
}

impl From<std::time::SystemTime> for AttrValue {
    fn from(at: std::time::SystemTime) -> Self {
        AttrValue::Time(OffsetDateTime::from(at))
    }
}

impl<S: Stringify> From<Vec<S>> for AttrValue {
    fn from(values: Vec<S>) -> Self {
        AttrValue::List(values.into_iter().map(|value| value.stringify()).collect())
    }
}
