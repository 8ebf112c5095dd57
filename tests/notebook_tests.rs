//! Notebook tests: a YAML pipeline run end to end against a DBFS root.

mod test_data_gen;

use tabkit_core::config::SessionConfig;
use tabkit_core::types::Scalar;
use tabkit_exec::{run_notebook, CellOutput, Session};
use tabkit_planner::parse_notebook;
use test_data_gen::{write_fixture, ADULT};

const NOTEBOOK: &str = r#"
load:
  file_location: "dbfs:/FileStore/tables/adult.csv"
  header: true
  infer_schema: true
view: adult_csv
cells:
  - op: print_schema
  - op: show
    rows: 2
  - op: sql
    query: "SELECT education, COUNT(*) FROM adult_csv GROUP BY education"
  - op: count
    where: "income = '>50K' AND education = 'Bachelors'"
  - op: group_count
    column: education
    where: "income = '>50K'"
"#;

#[test]
fn test_notebook_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "FileStore/tables/adult.csv", ADULT);
    let session = Session::new(SessionConfig::default().with_dbfs_root(root.path()));

    let notebook = parse_notebook(NOTEBOOK).unwrap();
    let out = run_notebook(&session, &notebook).unwrap();
    assert_eq!(out.len(), 5);

    assert!(matches!(&out[0], CellOutput::Schema(s) if s.contains("age: integer")));
    assert!(matches!(&out[1], CellOutput::Table(s) if s.ends_with("only showing top 2 rows\n")));
    assert!(matches!(&out[2], CellOutput::Table(s) if s.contains("|Bachelors|    2|")));
    assert_eq!(out[3], CellOutput::Count(1));
    match &out[4] {
        CellOutput::Groups(g) => {
            assert_eq!(g[&Scalar::from("Bachelors")], 1);
            assert_eq!(g[&Scalar::from("Masters")], 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(out[4].to_string(), "Bachelors: 1\nMasters: 1\n");
}

#[test]
fn test_notebook_rejects_bad_query_before_loading() {
    let bad = NOTEBOOK.replace("GROUP BY education", "GROUP BY");
    assert!(parse_notebook(&bad).is_err());
}

#[test]
fn test_notebook_missing_file() {
    let root = tempfile::tempdir().unwrap();
    let session = Session::new(SessionConfig::default().with_dbfs_root(root.path()));
    let notebook = parse_notebook(NOTEBOOK).unwrap();
    let err = run_notebook(&session, &notebook).unwrap_err();
    assert!(err.to_string().contains("dbfs:/FileStore/tables/adult.csv"));
}
