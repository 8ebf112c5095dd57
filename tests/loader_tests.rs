//! Loader tests: locations, header handling, inference and error cases.

mod test_data_gen;

use tabkit_core::config::{LoadOptions, SessionConfig};
use tabkit_core::schema::DataType;
use tabkit_core::types::Scalar;
use tabkit_exec::{ExecError, Session};
use tabkit_io::Error as IoError;
use test_data_gen::{synthetic_adult, write_fixture, ADULT};

fn header() -> LoadOptions {
    LoadOptions::csv().with_header(true)
}

#[test]
fn test_header_count_is_lines_minus_one() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::default();
    for rows in [0, 1, 7, 1000] {
        let src = synthetic_adult(rows);
        let path = write_fixture(dir.path(), &format!("adult_{rows}.csv"), &src);
        let df = session.load(path.to_str().unwrap(), &header()).unwrap();
        assert_eq!(df.count(), src.lines().count() - 1);
    }
}

#[test]
fn test_adult_with_and_without_header() {
    let session = Session::default();
    session.memory().insert("adult.csv", ADULT);

    let with = session.load("memory://adult.csv", &header()).unwrap();
    assert_eq!(with.count(), 3);
    assert_eq!(with.columns(), vec!["age", "education", "income"]);

    let without = session.load("memory://adult.csv", &LoadOptions::csv()).unwrap();
    assert_eq!(without.count(), with.count() + 1);
    assert_eq!(without.columns(), vec!["_c0", "_c1", "_c2"]);
    assert_eq!(without.collect()[0][1], Scalar::from("education"));
}

#[test]
fn test_nonexistent_location_is_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(SessionConfig::default().with_dbfs_root(dir.path()));
    let missing = dir.path().join("missing.csv");
    let locations = [
        missing.to_str().unwrap().to_string(),
        format!("file://{}", missing.display()),
        "dbfs:/FileStore/tables/missing.csv".to_string(),
        "memory://missing.csv".to_string(),
    ];
    for location in locations {
        match session.load(&location, &header()) {
            Err(ExecError::Load(IoError::ResourceNotFound { location: l })) => {
                assert_eq!(l, location)
            }
            other => panic!("{location}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_dbfs_and_file_uri_resolve_to_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "FileStore/tables/adult.csv", ADULT);
    let session = Session::new(SessionConfig::default().with_dbfs_root(dir.path()));

    let dbfs = session
        .load("dbfs:/FileStore/tables/adult.csv", &header())
        .unwrap();
    let uri = session
        .load(&format!("file://{}", path.display()), &header())
        .unwrap();
    assert_eq!(dbfs.collect(), uri.collect());
}

#[test]
fn test_dbfs_names_with_space_and_hash() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(SessionConfig::default().with_dbfs_root(dir.path()));
    for name in ["adult data.csv", "adult#1.csv"] {
        write_fixture(dir.path(), &format!("FileStore/tables/{name}"), ADULT);
        let df = session
            .load(&format!("dbfs:/FileStore/tables/{name}"), &header())
            .unwrap();
        assert_eq!(df.count(), 3, "{name}");
    }
}

#[test]
fn test_string_options_via_reader() {
    let session = Session::default();
    session
        .memory()
        .insert("adult.tsv", ADULT.replace(',', "\t"));
    let df = session
        .read()
        .format("csv")
        .option("header", "true")
        .option("inferSchema", "true")
        .option("sep", "\\t")
        .load("memory://adult.tsv")
        .unwrap();
    assert_eq!(df.schema().fields[0].data_type, DataType::Int64);
    assert_eq!(df.collect()[0][0], Scalar::Int(39));
    assert!(df.schema_string().contains(" |-- age: integer (nullable = true)"));
}

#[test]
fn test_malformed_and_empty_inputs() {
    let session = Session::default();
    session.memory().insert("ragged.csv", "a,b\n1,2\n3,4,5\n");
    session.memory().insert("empty.csv", "");

    match session.load("memory://ragged.csv", &header()) {
        Err(ExecError::Load(IoError::MalformedRow {
            line,
            expected,
            found,
            ..
        })) => assert_eq!((line, expected, found), (3, 2, 3)),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        session.load("memory://empty.csv", &header()),
        Err(ExecError::Load(IoError::EmptyInput { .. }))
    ));
}

#[test]
fn test_whitespace_only_lines_are_blank() {
    let session = Session::default();
    session.memory().insert("padded.csv", format!("{ADULT}\n   \n"));
    let df = session.load("memory://padded.csv", &header()).unwrap();
    assert_eq!(df.count(), 3);
}

#[test]
fn test_unsupported_scheme() {
    let err = Session::default()
        .load("s3://bucket/adult.csv", &header())
        .unwrap_err();
    assert!(matches!(err, ExecError::Load(IoError::UnsupportedScheme(s)) if s == "s3"));
}
