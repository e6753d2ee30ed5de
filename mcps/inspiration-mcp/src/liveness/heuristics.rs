//! URL and content-type heuristics

/// Substrings that mark a URL as an error page.
///
/// Matching URLs are treated as dead without any network call. This also
/// rejects legitimate URLs such as a post titled "404 error architecture";
/// the false positives are accepted for the saved requests.
const DEAD_MARKERS: &[&str] = &["404", "notfound", "not-found", "not_found", "error"];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "avif", "bmp", "tif", "tiff", "heic",
];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/x-pdf",
    "application/msword",
    "application/rtf",
    "application/epub+zip",
    "application/vnd.openxmlformats-officedocument",
    "application/vnd.ms-",
    "application/vnd.oasis.opendocument",
];

/// Whether `url` carries an error-page marker
pub fn looks_dead(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    DEAD_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Whether the path of `url` ends in a known image file extension
pub fn has_image_extension(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn normalized(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `image/*`
pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| normalized(ct).starts_with("image/"))
        .unwrap_or(false)
}

/// PDFs, office documents and e-books
pub fn is_document_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            let ct = normalized(ct);
            DOCUMENT_TYPES.iter().any(|doc| ct.starts_with(doc)) || ct.contains("pdf")
        })
        .unwrap_or(false)
}

/// A reported content type that is definitely not an image.
///
/// Generic binary types are not conclusive, since many CDNs serve images that way.
pub fn is_confirmed_non_image(content_type: Option<&str>) -> bool {
    match content_type.map(normalized) {
        Some(ct) if ct.is_empty() => false,
        Some(ct) => {
            !ct.starts_with("image/")
                && ct != "application/octet-stream"
                && ct != "binary/octet-stream"
        }
        None => false,
    }
}
