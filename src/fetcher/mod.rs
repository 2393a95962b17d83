pub mod client;
pub mod errors;
pub mod headers;
pub mod pipeline;
pub mod source;
pub mod types;

pub use client::HttpPageSource;
pub use errors::FetchError;
pub use headers::HeaderSet;
pub use source::PageSource;
pub use types::{Charset, PageResponse};
