//! Request body encoding
//!
//! Pair lists become `application/x-www-form-urlencoded` text, or a
//! `multipart/form-data` body when uploads are involved. Both keep the
//! pair order and repeated names exactly as given.

use std::borrow::Cow;

use url::form_urlencoded;

use crate::config::TestAppConfig;
use crate::error::Result;
use crate::forms::{SubmitValue, Upload, UploadField};

/// Default body content type for pair lists
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

const FALLBACK_FILE_TYPE: &str = "application/octet-stream";

/// URL-encode a pair list; file values contribute their filename
#[must_use]
pub fn urlencode(pairs: &[(String, SubmitValue)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        match value {
            SubmitValue::Text(text) => serializer.append_pair(name, text),
            SubmitValue::File(upload) => serializer.append_pair(name, &upload.filename),
        };
    }
    serializer.finish()
}

/// Decode `a=1&b=2` into a pair list, keeping blank values
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, SubmitValue)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(name, value)| (name.into_owned(), SubmitValue::Text(value.into_owned())))
        .collect()
}

fn random_boundary() -> String {
    format!("----------a_BoUnDaRy{}$", rand::random::<u64>())
}

/// Encode pairs plus extra files as `multipart/form-data`
///
/// Returns `(content_type, body)`. Upload parts without inline content
/// are read from disk through [`TestAppConfig::upload_path`].
///
/// # Errors
///
/// [`crate::error::WebProbeError::TypeMismatch`] for non-ASCII text
/// content, [`crate::error::WebProbeError::Io`] when a file cannot be read.
pub fn encode_multipart(
    pairs: &[(String, SubmitValue)],
    files: &[UploadField],
    config: &TestAppConfig,
) -> Result<(String, Vec<u8>)> {
    let boundary = random_boundary();
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in pairs {
        match value {
            SubmitValue::Text(text) => {
                body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
            SubmitValue::File(upload) => append_file(&mut body, &boundary, name, upload, config)?,
        }
    }
    for file in files {
        append_file(&mut body, &boundary, &file.name, &file.upload, config)?;
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok((format!("multipart/form-data; boundary={boundary}"), body))
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    upload: &Upload,
    config: &TestAppConfig,
) -> Result<()> {
    let content: Cow<'_, [u8]> = match &upload.content {
        Some(content) => content.as_bytes()?,
        None => Cow::Owned(std::fs::read(config.upload_path(&upload.filename))?),
    };
    let content_type = upload.content_type.as_deref().unwrap_or_else(|| {
        mime_guess::from_path(&upload.filename)
            .first_raw()
            .unwrap_or(FALLBACK_FILE_TYPE)
    });

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
            upload.filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(&content);
    body.extend_from_slice(b"\r\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebProbeError;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, SubmitValue)> {
        items
            .iter()
            .map(|(n, v)| ((*n).to_string(), SubmitValue::from(*v)))
            .collect()
    }

    fn boundary_of(content_type: &str) -> &str {
        content_type
            .split("boundary=")
            .nth(1)
            .expect("content type has a boundary")
    }

    #[test]
    fn test_urlencode_keeps_order_and_repeats() {
        let encoded = urlencode(&pairs(&[("letter", "a"), ("n", "1 2"), ("letter", "&")]));
        assert_eq!(encoded, "letter=a&n=1+2&letter=%26");
    }

    #[test]
    fn test_parse_query_keeps_blank_values() {
        let parsed = parse_query("a=&b=2");
        assert_eq!(parsed, pairs(&[("a", ""), ("b", "2")]));
    }

    #[test]
    fn test_multipart_layout() {
        let mut items = pairs(&[("title", "hello")]);
        items.push((
            "doc".to_string(),
            SubmitValue::File(Upload::with_content("notes.txt", "abc")),
        ));
        let (content_type, body) =
            encode_multipart(&items, &[], &TestAppConfig::default()).unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary=----------a_BoUnDaRy"));
        let boundary = boundary_of(&content_type);
        assert!(boundary.ends_with('$'));

        let expected = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             hello\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             abc\r\n\
             --{boundary}--\r\n"
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_octet_stream() {
        let files = [UploadField::new(
            "blob",
            Upload::with_content("data.zzzunknown", vec![0_u8, 159, 146, 150]),
        )];
        let (_, body) = encode_multipart(&[], &files, &TestAppConfig::default()).unwrap();
        let needle = b"Content-Type: application/octet-stream\r\n\r\n\x00\x9f\x92\x96";
        assert!(body.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let files = [UploadField::new(
            "f",
            Upload::with_content("a.txt", "x").content_type("text/x-custom"),
        )];
        let (_, body) = encode_multipart(&[], &files, &TestAppConfig::default()).unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Content-Type: text/x-custom"));
    }

    #[test]
    fn test_non_ascii_text_content_is_rejected() {
        let files = [UploadField::new(
            "f",
            Upload::with_content("a.txt", "caf\u{e9}"),
        )];
        let err = encode_multipart(&[], &files, &TestAppConfig::default()).unwrap_err();
        assert!(matches!(err, WebProbeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filename_only_upload_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), b"a,b\n1,2\n").unwrap();
        let config = TestAppConfig::default().relative_to(dir.path());
        let files = [UploadField::new("f", Upload::new("data.csv"))];
        let (_, body) = encode_multipart(&[], &files, &config).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("filename=\"data.csv\""));
        assert!(text.contains("a,b\n1,2\n"));

        let missing = [UploadField::new("f", Upload::new("missing.csv"))];
        assert!(matches!(
            encode_multipart(&[], &missing, &config),
            Err(WebProbeError::Io(_))
        ));
    }
}
