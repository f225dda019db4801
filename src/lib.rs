pub mod cookie;
pub mod errors;
pub mod request;

pub use cookie::*;
pub use errors::CookieError;
pub use request::{RequestContext, RequestContextHandle, ResponseBuffer};
