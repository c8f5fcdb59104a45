mod atom;
pub mod date;
pub mod models;
pub mod modules;
mod parser;
mod rss;
mod writer;
pub mod xml;

pub use models::{ElementExtension, Feed, Item, Link, Person};
pub use modules::{ExtensionModule, ModuleRegistry, Target};
pub use parser::{is_feed_media_type, parse_feed, parse_with_media_type, FeedParser};
pub use writer::write_rss;
