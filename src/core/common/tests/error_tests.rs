use crate::core::common::error::KdError;
use crate::core::indexing::kdtree::KdTreeError;
use std::error::Error; // Import the Error trait
use std::io;

#[test]
fn test_error_display_and_source() {
    let io_err = KdError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
    assert_eq!(format!("{}", io_err), "IO Error: file not found");
    assert!(io_err.source().is_some());

    let parse_err = KdError::Parse {
        line: 3,
        message: "'abc' is not a number".to_string(),
    };
    assert_eq!(
        format!("{}", parse_err),
        "Parsing Error at line 3: 'abc' is not a number"
    );
    assert!(parse_err.source().is_none());

    let ragged = KdError::RaggedRow {
        line: 2,
        expected: 3,
        found: 2,
    };
    assert_eq!(
        format!("{}", ragged),
        "Ragged row at line 2: expected 3 fields, found 2"
    );
}

#[test]
fn test_file_error_names_path() {
    let err = KdError::file(
        "/no/such/model.csv",
        io::Error::new(io::ErrorKind::NotFound, "not found"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("/no/such/model.csv"));
    assert!(err.source().is_some());
}

#[test]
fn test_from_std_io_error() {
    let std_io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
    let kd_err: KdError = std_io_err.into();
    match kd_err {
        KdError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
        _ => panic!("Expected KdError::Io variant"),
    }
}

#[test]
fn test_tree_error_is_transparent() {
    let tree_err = KdTreeError::TruncatedModel { missing: 2 };
    let expected = tree_err.to_string();
    let kd_err: KdError = tree_err.into();
    assert_eq!(kd_err.to_string(), expected);
    assert!(matches!(
        kd_err,
        KdError::Tree(KdTreeError::TruncatedModel { missing: 2 })
    ));
}
