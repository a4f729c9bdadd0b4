use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CamRigError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        CamRigError::protocol("x")
            .to_string()
            .contains("protocol violation:")
    );
    assert!(
        CamRigError::combination("x")
            .to_string()
            .contains("combination conflict:")
    );
    assert!(
        CamRigError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        CamRigError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CamRigError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn bincode_errors_map_to_serde() {
    let bytes: &[u8] = &[];
    let err: bincode::Error = bincode::deserialize::<u64>(bytes).unwrap_err();
    let err = CamRigError::from(err);
    assert!(matches!(err, CamRigError::Serde(_)));
}
