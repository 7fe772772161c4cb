//! Request decorators that attach feed credentials.

mod api_key;

pub use api_key::{ApiKey, InvalidApiKey, MTA_API_KEY_HEADER};
