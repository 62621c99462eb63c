//! Helper functions shared by the feed generator and the post codec

mod date;
mod url;

pub use date::*;
pub use url::*;
