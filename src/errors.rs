#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("unknown cookie attribute '{0}'")]
    UnknownAttribute(String),

    #[error("wrong value type for attribute '{attr}': expected {expected}")]
    WrongValueType {
        attr: &'static str,
        expected: &'static str,
    },

    #[error("cookie value list cannot be empty")]
    EmptyValues,

    #[error("cookie has no name")]
    MissingName,

    #[error("cookie has no values")]
    MissingValues,

    #[error("cookie is already bound to a request")]
    AlreadyBound,

    #[error("cookie is not bound to a request")]
    NotBound,
}
