//! Input parsing: URL lists and direct-image classification.
//!
//! # Example
//!
//! ```
//! use harvester_core::parser::{is_direct_image, parse_url_list};
//!
//! let urls = parse_url_list("https://example.com/gallery\n\nhttps://example.com/a.JPG\n");
//! assert_eq!(urls.len(), 2);
//! assert!(!is_direct_image(&urls[0]));
//! assert!(is_direct_image(&urls[1]));
//! ```

mod input;
mod url;

pub use input::parse_url_list;
pub use url::{IMAGE_EXTENSIONS, image_extension, is_direct_image};
