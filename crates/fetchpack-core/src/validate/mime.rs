//! Content-type normalization and canonical names per MIME type.

/// Lower-cased media type without parameters: `"Image/JPEG; q=1"` → `"image/jpeg"`.
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Extensions (with leading dot) that are considered correct for a MIME type.
/// The first one is used when an entry name has to be fixed up.
/// Unknown types return an empty slice.
pub fn canonical_extensions(content_type: &str) -> &'static [&'static str] {
    match normalize_content_type(content_type).as_str() {
        "application/pdf" => &[".pdf"],
        "image/jpeg" | "image/jpg" => &[".jpeg", ".jpg"],
        "image/png" => &[".png"],
        "image/gif" => &[".gif"],
        "text/plain" => &[".txt"],
        "application/zip" => &[".zip"],
        _ => &[],
    }
}

/// Entry name used when nothing usable can be derived from the URL.
pub fn default_file_name(content_type: &str) -> &'static str {
    match normalize_content_type(content_type).as_str() {
        "application/pdf" => "document.pdf",
        "image/jpeg" | "image/jpg" => "image.jpeg",
        "image/png" => "image.png",
        "image/gif" => "image.gif",
        "text/plain" => "document.txt",
        "application/zip" => "archive.zip",
        _ => "file.bin",
    }
}
