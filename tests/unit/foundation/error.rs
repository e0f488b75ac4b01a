use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LectioError::precondition("x")
            .to_string()
            .contains("precondition violated:")
    );
    assert!(
        LectioError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LectioError::transient("x")
            .to_string()
            .contains("transient upstream failure:")
    );
    assert!(LectioError::encode("x").to_string().contains("encode error:"));
    assert!(
        LectioError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
}

#[test]
fn only_transient_errors_are_retryable() {
    assert!(LectioError::transient("429").is_transient());
    assert!(!LectioError::upstream("400").is_transient());
    assert!(!LectioError::precondition("no audio").is_transient());
    assert!(!LectioError::encode("bad codec").is_transient());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LectioError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
