//! Client for the Google Slides REST API, scoped to what the writer needs:
//! fetching a presentation, locating text boxes by vertical position, and
//! replacing the text they contain through `batchUpdate`.

mod client;
mod config;
mod error;
mod models;
mod resolver;
mod updater;

pub use client::SlidesClient;
pub use config::Config;
pub use error::Result;
pub use error::SlidesError;
pub use models::BatchUpdateResponse;
pub use models::Page;
pub use models::PageElement;
pub use models::Presentation;
pub use models::Request;
pub use models::Shape;
pub use models::TextContent;
pub use models::TextElement;
pub use models::TextRange;
pub use models::TextRun;
pub use models::Transform;
pub use resolver::TextBoxPair;
pub use resolver::find_title_shape;
pub use resolver::resolve_text_boxes;
pub use updater::element_has_text;
pub use updater::overwrite_text;
pub use updater::replace_text;
