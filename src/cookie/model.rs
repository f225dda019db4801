//! The cookie model itself.

use std::fmt;

use crate::cookie::attributes::{AttrKey, AttrValue};
use crate::cookie::expires::{default_engine, format_cookie_date, ExpiresInput, ExpiryEngineHandle};
use crate::cookie::values::{Stringify, ValuesInput};
use crate::errors::CookieError;
use crate::request::RequestContextHandle;

/// An outbound HTTP cookie, bound to the request whose response will
/// carry it.
///
/// A cookie is created against a live request context, mutated through
/// its accessors or an attribute bundle, and finally serialized with
/// [`Cookie::header_value`] or attached to the response with
/// [`Cookie::bake`]. Serialization is a pure read and may be repeated.
///
/// ```
/// use bakery::{AttrValue, Cookie, ResponseBuffer};
///
/// let response = ResponseBuffer::new();
/// let mut cookie = Cookie::with_attributes(
///     response.clone(),
///     [("name", AttrValue::from("session")), ("value", AttrValue::from("abc123"))],
/// )?;
/// cookie.set_path("/");
/// cookie.bake()?;
///
/// assert_eq!(response.header_values("set-cookie"), vec!["session=abc123; Path=/"]);
/// # Ok::<(), bakery::CookieError>(())
/// ```
pub struct Cookie {
    /// The owning request. `None` only between [`Cookie::unbound`] and
    /// [`Cookie::bind`].
    request: Option<RequestContextHandle>,

    /// Delegate that resolves raw expiration strings.
    expiry: ExpiryEngineHandle,

    /// Cookie name; unset until assigned.
    name: Option<String>,

    /// Ordered values; the first one is the primary value.
    values: Vec<String>,

    /// Domain scoping. Absent means unset, distinct from empty.
    domain: Option<String>,

    /// Path scoping.
    path: Option<String>,

    /// Fully computed expiration string; absent means a session cookie.
    expires: Option<String>,

    /// Only send over an encrypted channel.
    secure: bool,
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("bound", &self.request.is_some())
            .field("name", &self.name)
            .field("values", &self.values)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("secure", &self.secure)
            .finish()
    }
}

impl Cookie {
    /// Creates a cookie bound to `ctx`.
    pub fn new(ctx: RequestContextHandle) -> Cookie {
        let mut cookie = Cookie::unbound();
        cookie.request = Some(ctx);
        cookie
    }

    /// Creates a bound cookie and applies an attribute bundle, entries in
    /// iteration order.
    ///
    /// Application is not transactional: the first failing entry aborts
    /// construction with the offending key in the error.
    pub fn with_attributes<I, K>(ctx: RequestContextHandle, attrs: I) -> Result<Cookie, CookieError>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: AsRef<str>,
    {
        let mut cookie = Cookie::new(ctx);
        cookie.apply_attributes(attrs)?;
        Ok(cookie)
    }

    /// Creates a cookie not yet bound to a request.
    ///
    /// Binding layers that allocate the object before the request handle
    /// is available pair this with [`Cookie::bind`].
    pub fn unbound() -> Cookie {
        Cookie {
            request: None,
            expiry: default_engine(),
            name: None,
            values: Vec::new(),
            domain: None,
            path: None,
            expires: None,
            secure: false,
        }
    }

    /// Binds the cookie to its owning request. The binding is write-once:
    /// a second call fails.
    pub fn bind(&mut self, ctx: RequestContextHandle) -> Result<(), CookieError> {
        if self.request.is_some() {
            return Err(CookieError::AlreadyBound);
        }
        self.request = Some(ctx);
        Ok(())
    }

    /// Swaps the expiry delegate. The default is a process-wide shared
    /// [`DeltaExpiry`](crate::cookie::DeltaExpiry).
    pub fn with_expiry_engine(mut self, engine: ExpiryEngineHandle) -> Cookie {
        self.expiry = engine;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Stringify) {
        self.name = Some(name.stringify());
    }

    /// The primary (first) value.
    pub fn value(&self) -> Result<&str, CookieError> {
        self.values
            .first()
            .map(String::as_str)
            .ok_or(CookieError::MissingValues)
    }

    /// All values, in insertion order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Replaces the value list. Assigning an empty collection fails and
    /// leaves the current values untouched.
    pub fn set_values(&mut self, input: impl Into<ValuesInput>) -> Result<(), CookieError> {
        self.values = input.into().into_values()?;
        Ok(())
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: impl Stringify) {
        self.domain = Some(domain.stringify());
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Stringify) {
        self.path = Some(path.stringify());
    }

    /// The computed expiration string, if any.
    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }

    /// Sets the expiration. Absolute instants are canonicalized to
    /// `Wdy, DD-Mon-YYYY HH:MM:SS GMT` immediately; raw strings go
    /// through the expiry delegate.
    pub fn set_expires(&mut self, input: impl Into<ExpiresInput>) {
        self.expires = Some(match input.into() {
            ExpiresInput::Absolute(at) => format_cookie_date(at),
            ExpiresInput::Raw(raw) => self.expiry.compute_expiry(&raw),
        });
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    /// Applies one `(key, value)` bundle entry.
    pub fn apply_attribute(&mut self, key: &str, value: AttrValue) -> Result<(), CookieError> {
        match AttrKey::parse(key)? {
            AttrKey::Name => self.name = Some(value.into_text("name")?),
            AttrKey::Value => self.set_values(value.into_values_input("value")?)?,
            AttrKey::Expires => self.set_expires(value.into_expires_input("expires")?),
            AttrKey::Domain => self.domain = Some(value.into_text("domain")?),
            AttrKey::Path => self.path = Some(value.into_text("path")?),
            AttrKey::Secure => self.secure = value.truthy(),
        }
        Ok(())
    }

    /// Applies a bundle of entries in iteration order, stopping at the
    /// first violation. Entries applied before the violation stick.
    pub fn apply_attributes<I, K>(&mut self, attrs: I) -> Result<(), CookieError>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: AsRef<str>,
    {
        for (key, value) in attrs {
            self.apply_attribute(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Serializes into the `Set-Cookie` header value:
    /// `name=value1&value2; Domain=...; Path=...; Expires=...; Secure`,
    /// unset attributes omitted. The name and every value are
    /// percent-encoded on output; stored state is left untouched.
    pub fn header_value(&self) -> Result<String, CookieError> {
        let name = self.name.as_deref().ok_or(CookieError::MissingName)?;

        let mut header = String::new();
        header.push_str(&urlencoding::encode(name));
        header.push('=');
        header.push_str(
            &self
                .values
                .iter()
                .map(|value| urlencoding::encode(value))
                .collect::<Vec<_>>()
                .join("&"),
        );

        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if let Some(path) = &self.path {
            header.push_str("; Path=");
            header.push_str(path);
        }
        if let Some(expires) = &self.expires {
            header.push_str("; Expires=");
            header.push_str(expires);
        }
        if self.secure {
            header.push_str("; Secure");
        }

        Ok(header)
    }

    /// Appends the serialized cookie to the owning request's response
    /// headers. Every call appends another header; nothing deduplicates.
    pub fn bake(&self) -> Result<(), CookieError> {
        let request = self.request.as_ref().ok_or(CookieError::NotBound)?;
        let name = self.name.as_deref().ok_or(CookieError::MissingName)?;
        if self.values.is_empty() {
            return Err(CookieError::MissingValues);
        }

        let header = self.header_value()?;
        request.append_response_header(http::header::SET_COOKIE.as_str(), &header);
        log::debug!("baked cookie '{}' onto the response", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::cookie::expires::DeltaExpiry;
    use crate::request::ResponseBuffer;

    fn bound_cookie() -> (Arc<ResponseBuffer>, Cookie) {
        let response = ResponseBuffer::new();
        let cookie = Cookie::new(response.clone());
        (response, cookie)
    }

    #[test]
    fn serializes_name_values_and_flags() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_name("session");
        cookie.set_values("abc123").unwrap();
        cookie.set_path("/");
        cookie.set_secure(true);

        let header = cookie.header_value().unwrap();
        assert_eq!(header, "session=abc123; Path=/; Secure");
        assert!(!header.contains("Domain="));
        assert!(!header.contains("Expires="));
    }

    #[test]
    fn multiple_values_join_with_ampersands() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_name("search_tags");
        cookie
            .set_values(vec!["ruby", "ldap", "digest", "authentication", "dn", "filter"])
            .unwrap();

        assert_eq!(
            cookie.header_value().unwrap(),
            "search_tags=ruby&ldap&digest&authentication&dn&filter"
        );
    }

    #[test]
    fn attribute_order_is_fixed() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_name("session");
        cookie.set_values("abc123").unwrap();
        cookie.set_domain("example.com");
        cookie.set_path("/");
        cookie.set_expires(datetime!(1999-04-25 00:40:33 UTC));
        cookie.set_secure(true);

        assert_eq!(
            cookie.header_value().unwrap(),
            "session=abc123; Domain=example.com; Path=/; Expires=Sun, 25-Apr-1999 00:40:33 GMT; Secure"
        );
    }

    #[test]
    fn name_only_cookie_serializes_to_an_empty_pair() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_name("session_id");

        assert_eq!(cookie.header_value().unwrap(), "session_id=");
    }

    #[test]
    fn unnamed_cookie_does_not_serialize() {
        let (_, cookie) = bound_cookie();
        assert!(matches!(cookie.header_value(), Err(CookieError::MissingName)));
    }

    #[test]
    fn reserved_characters_are_encoded_on_output_only() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_name("tag list");
        cookie.set_values(vec!["a&b", "c d"]).unwrap();

        assert_eq!(cookie.header_value().unwrap(), "tag%20list=a%26b&c%20d");
        assert_eq!(cookie.values(), ["a&b", "c d"]);
    }

    #[test]
    fn value_getter_returns_the_first_value() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_values(vec!["first", "second"]).unwrap();

        assert_eq!(cookie.value().unwrap(), "first");
    }

    #[test]
    fn value_getter_fails_without_values() {
        let (_, cookie) = bound_cookie();
        assert!(matches!(cookie.value(), Err(CookieError::MissingValues)));
    }

    #[test]
    fn set_values_replaces_instead_of_appending() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_values("one").unwrap();
        cookie.set_values(vec!["two", "three"]).unwrap();

        assert_eq!(cookie.values(), ["two", "three"]);
    }

    #[test]
    fn empty_assignment_is_rejected_and_keeps_state() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_values("keep").unwrap();

        let err = cookie.set_values(ValuesInput::Many(Vec::new())).unwrap_err();
        assert!(matches!(err, CookieError::EmptyValues));
        assert_eq!(cookie.values(), ["keep"]);
    }

    #[test]
    fn raw_expiration_strings_store_verbatim() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_expires("Thursday, 25-Apr-1999 00:40:33 GMT");

        assert_eq!(cookie.expires(), Some("Thursday, 25-Apr-1999 00:40:33 GMT"));
    }

    #[test]
    fn absolute_expirations_canonicalize() {
        let (_, mut cookie) = bound_cookie();
        cookie.set_expires(datetime!(1999-04-25 00:40:33 UTC));

        assert_eq!(cookie.expires(), Some("Sun, 25-Apr-1999 00:40:33 GMT"));
    }

    #[test]
    fn relative_offsets_resolve_through_the_engine() {
        let (_, cookie) = bound_cookie();
        let mut cookie = cookie.with_expiry_engine(Arc::new(DeltaExpiry::anchored(
            datetime!(2009-02-13 23:31:30 UTC),
        )));
        cookie.set_expires("+1h");

        assert_eq!(cookie.expires(), Some("Sat, 14-Feb-2009 00:31:30 GMT"));
    }

    #[test]
    fn attribute_bundle_applies_in_order() {
        let response = ResponseBuffer::new();
        let cookie = Cookie::with_attributes(
            response,
            [
                ("name", AttrValue::from("session")),
                ("value", AttrValue::from(vec!["a", "b"])),
                ("domain", AttrValue::from("example.com")),
                ("secure", AttrValue::from(1i64)),
            ],
        )
        .unwrap();

        assert_eq!(cookie.name(), Some("session"));
        assert_eq!(cookie.values(), ["a", "b"]);
        assert_eq!(cookie.domain(), Some("example.com"));
        assert!(cookie.secure());
    }

    #[test]
    fn later_bundle_entries_win() {
        let response = ResponseBuffer::new();
        let cookie = Cookie::with_attributes(
            response,
            [("name", AttrValue::from("a")), ("name", AttrValue::from("b"))],
        )
        .unwrap();

        assert_eq!(cookie.name(), Some("b"));
    }

    #[test]
    fn unknown_bundle_key_fails_naming_it() {
        let response = ResponseBuffer::new();
        let err = Cookie::with_attributes(response, [("foo", AttrValue::from("bar"))]).unwrap_err();

        match err {
            CookieError::UnknownAttribute(key) => assert_eq!(key, "foo"),
            other => panic!("expected UnknownAttribute, got {:?}", other),
        }
    }

    #[test]
    fn bundle_failure_keeps_earlier_entries() {
        let (_, mut cookie) = bound_cookie();
        let err = cookie
            .apply_attributes([("name", AttrValue::from("kept")), ("bogus", AttrValue::from("x"))])
            .unwrap_err();

        assert!(matches!(err, CookieError::UnknownAttribute(_)));
        assert_eq!(cookie.name(), Some("kept"));
    }

    #[test]
    fn secure_flag_follows_bundle_truthiness() {
        let (_, mut cookie) = bound_cookie();

        cookie.apply_attribute("secure", AttrValue::from("yes")).unwrap();
        assert!(cookie.secure());

        cookie.apply_attribute("secure", AttrValue::from("")).unwrap();
        assert!(!cookie.secure());

        cookie.apply_attribute("secure", AttrValue::from(0i64)).unwrap();
        assert!(!cookie.secure());
    }

    #[test]
    fn bake_appends_one_set_cookie_header() {
        let (response, mut cookie) = bound_cookie();
        cookie.set_name("session");
        cookie.set_values("abc123").unwrap();
        cookie.set_path("/");

        cookie.bake().unwrap();
        assert_eq!(response.header_values("set-cookie"), vec!["session=abc123; Path=/"]);
    }

    #[test]
    fn bake_twice_appends_two_headers() {
        let (response, mut cookie) = bound_cookie();
        cookie.set_name("session");
        cookie.set_values("abc123").unwrap();

        cookie.bake().unwrap();
        cookie.bake().unwrap();
        assert_eq!(response.header_values("set-cookie").len(), 2);
    }

    #[test]
    fn bake_without_name_leaves_the_response_untouched() {
        let (response, mut cookie) = bound_cookie();
        cookie.set_values("abc123").unwrap();

        assert!(matches!(cookie.bake(), Err(CookieError::MissingName)));
        assert!(response.is_empty());
    }

    #[test]
    fn bake_without_values_leaves_the_response_untouched() {
        let (response, mut cookie) = bound_cookie();
        cookie.set_name("session");

        assert!(matches!(cookie.bake(), Err(CookieError::MissingValues)));
        assert!(response.is_empty());
    }

    #[test]
    fn binding_is_write_once() {
        let (_, mut cookie) = bound_cookie();
        let other = ResponseBuffer::new();

        assert!(matches!(cookie.bind(other), Err(CookieError::AlreadyBound)));
    }

    #[test]
    fn unbound_cookie_bakes_only_after_bind() {
        let mut cookie = Cookie::unbound();
        cookie.set_name("n");
        cookie.set_values("v").unwrap();

        assert!(matches!(cookie.bake(), Err(CookieError::NotBound)));

        let response = ResponseBuffer::new();
        cookie.bind(response.clone()).unwrap();
        cookie.bake().unwrap();

        assert_eq!(response.header_values("set-cookie"), vec!["n=v"]);
    }
}
