use super::*;

fn upload(content_type: &str, size: u64) -> ImageUpload {
    ImageUpload { file_name: "panel.png".into(), content_type: content_type.into(), size }
}

#[test]
fn accepts_png_under_cap() {
    assert!(UploadPolicy::default().validate(&upload("image/png", 1024)).is_ok());
}

#[test]
fn accepts_exactly_the_cap() {
    let policy = UploadPolicy { max_bytes: 10 };
    assert!(policy.validate(&upload("image/jpeg", 10)).is_ok());
}

#[test]
fn accepts_mime_with_parameters_and_case() {
    assert!(UploadPolicy::default().validate(&upload("Image/SVG+xml; charset=utf-8", 5)).is_ok());
}

#[test]
fn rejects_non_image() {
    let err = UploadPolicy::default().validate(&upload("application/pdf", 5)).unwrap_err();
    assert!(matches!(err, UploadError::NotAnImage { .. }));
    assert_eq!(err.to_string(), "panel.png is not an image (got application/pdf)");
}

#[test]
fn rejects_bare_image_prefix() {
    let err = UploadPolicy::default().validate(&upload("image/", 5)).unwrap_err();
    assert!(matches!(err, UploadError::NotAnImage { .. }));
}

#[test]
fn rejects_empty_file() {
    let err = UploadPolicy::default().validate(&upload("image/png", 0)).unwrap_err();
    assert_eq!(err, UploadError::Empty { file_name: "panel.png".into() });
}

#[test]
fn rejects_over_cap() {
    let policy = UploadPolicy { max_bytes: 10 };
    let err = policy.validate(&upload("image/gif", 11)).unwrap_err();
    assert_eq!(err, UploadError::TooLarge { file_name: "panel.png".into(), size: 11, max_bytes: 10 });
}

#[test]
fn error_codes_are_stable() {
    use crate::error::ErrorCode;
    let err = UploadPolicy::default().validate(&upload("text/plain", 1)).unwrap_err();
    assert_eq!(err.error_code(), "E_UPLOAD_NOT_IMAGE");
    assert!(!err.retryable());
}
