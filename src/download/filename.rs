//! Output filename derivation: basename extraction, sanitization, and the
//! optional prefix/number scheme.

use std::path::{Component, Path};

/// Derives output filenames for a run.
///
/// With numbering enabled and a non-empty prefix, names take the form
/// `{prefix}{number}_{basename}` with the number zero-padded to `digits`;
/// the cursor advances once per name. With a prefix only the form is
/// `{prefix}{basename}`, and otherwise the basename is used as is.
///
/// ```
/// use harvester_core::download::FileNamer;
///
/// let mut namer = FileNamer::new("img_", true, 1, 3);
/// assert_eq!(namer.next_filename("a.jpg"), "img_001_a.jpg");
/// assert_eq!(namer.next_filename("b.png"), "img_002_b.png");
/// assert_eq!(namer.cursor(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamer {
    prefix: String,
    use_numbering: bool,
    cursor: u64,
    digits: usize,
}

impl Default for FileNamer {
    fn default() -> Self {
        Self::new("", false, 1, 3)
    }
}

impl FileNamer {
    /// Creates a namer; the prefix is sanitized for the filesystem.
    #[must_use]
    pub fn new(prefix: &str, use_numbering: bool, start_number: u64, digits: usize) -> Self {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            sanitize_filename(prefix)
        };
        Self {
            prefix,
            use_numbering,
            cursor: start_number,
            digits,
        }
    }

    /// Returns the number the next numbered filename will carry.
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Returns true when names will carry a sequence number.
    #[must_use]
    pub fn is_numbering(&self) -> bool {
        self.use_numbering && !self.prefix.is_empty()
    }

    /// Derives the filename for `basename`, advancing the cursor when
    /// numbering applies.
    pub fn next_filename(&mut self, basename: &str) -> String {
        if self.is_numbering() {
            let number = self.cursor;
            self.cursor = self.cursor.saturating_add(1);
            format!(
                "{}{:0width$}_{basename}",
                self.prefix,
                number,
                width = self.digits
            )
        } else if self.prefix.is_empty() {
            basename.to_string()
        } else {
            format!("{}{basename}", self.prefix)
        }
    }
}

/// Last path segment of an already percent-decoded URL, sanitized.
///
/// The query and fragment are ignored. No further decoding happens, so an
/// escape that survived the single decode stays literal in the name.
/// `None` when the path ends in `/` or is empty.
pub(crate) fn basename_from_decoded(decoded: &str) -> Option<String> {
    let without_fragment = decoded.split('#').next()?;
    let without_query = without_fragment.split('?').next()?;
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => without_query,
    };
    let last = path.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    Some(sanitize_filename(last))
}

/// Sanitizes a filename for safe filesystem storage.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
