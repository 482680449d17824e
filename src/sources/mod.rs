pub mod article;
pub mod html;
pub mod http;
pub mod markdown;
pub mod registry;
pub mod rss;
pub mod traits;
pub mod transcript;
pub mod window;
pub mod youtube;

pub use html::HtmlIndexSource;
pub use http::HttpFetcher;
pub use registry::{AdapterOptions, SourceRegistry};
pub use rss::RssSource;
pub use traits::SourceAdapter;
pub use window::{filter_window, TimeWindow};
pub use youtube::YouTubeSource;
