//! Direct-image URL classification.

use url::Url;

/// File extensions (lower-case, with leading dot) treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Returns true when the URL path already names an image resource.
///
/// The path is lower-cased before matching, so `/A.JPG` counts. Malformed
/// URLs are never direct images; they get crawled (and fail) as pages.
#[must_use]
pub fn is_direct_image(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Returns the lower-cased extension (with dot) of the last path segment.
///
/// `None` when the segment is empty, has no dot, or only a leading dot
/// (`/.jpg` is a hidden file, not a JPEG).
#[must_use]
pub fn image_extension(path: &str) -> Option<String> {
    let last_segment = path.rsplit('/').next()?;
    let dot_index = last_segment.rfind('.')?;
    if dot_index == 0 {
        return None;
    }
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 {
        return None;
    }
    Some(ext.to_lowercase())
}
