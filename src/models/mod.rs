pub mod url;

pub use url::{ClickEvent, ShortenRequest, UrlMapping, UrlMappingDto};
