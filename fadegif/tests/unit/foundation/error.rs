use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FadeGifError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FadeGifError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        FadeGifError::encode("x")
            .to_string()
            .contains("encode error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FadeGifError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn user_errors_are_validation_and_decode_only() {
    assert!(FadeGifError::validation("x").is_user_error());
    assert!(FadeGifError::decode("x").is_user_error());
    assert!(!FadeGifError::encode("x").is_user_error());
    assert!(!FadeGifError::Other(anyhow::anyhow!("io")).is_user_error());
}
