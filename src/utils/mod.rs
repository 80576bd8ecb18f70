pub mod base64;
pub mod http;

pub use self::base64::{base64_encode, url_safe_base64_encode};
pub use http::{is_link, web_get_async};
