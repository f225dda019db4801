// src/cookie.rs
//! The outbound cookie model: [`Cookie`], its attribute boundary and expiry computation.

mod attributes;
mod expires;
mod model;
mod values;

pub use attributes::AttrKey;
pub use attributes::AttrValue;

pub use expires::format_cookie_date;
pub use expires::DeltaExpiry;
pub use expires::ExpiresInput;
pub use expires::ExpiryEngine;
pub use expires::ExpiryEngineHandle;
pub use expires::COOKIE_DATE_FORMAT;

pub use model::Cookie;

pub use values::Stringify;
pub use values::ValuesInput;
