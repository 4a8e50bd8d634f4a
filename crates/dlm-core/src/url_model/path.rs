//! File name hint from a URI path.

use percent_encoding::percent_decode_str;

/// Last non-empty path segment of `uri`, percent-decoded.
///
/// Returns `None` if the URI cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(uri: &str) -> Option<String> {
    let parsed = url::Url::parse(uri).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}
