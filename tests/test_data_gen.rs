//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabkit_core::schema::{DataType, Field, Schema};
use tabkit_exec::Record;

pub const ADULT: &str =
    "age,education,income\n39,Bachelors,<=50K\n50,Masters,>50K\n38,Bachelors,>50K";

const EDUCATION: [&str; 4] = ["Bachelors", "Masters", "HS-grad", "Doctorate"];

/// Deterministic adult-shaped CSV with a header and `rows` data lines.
pub fn synthetic_adult(rows: usize) -> String {
    let mut out = String::from("age,education,income\n");
    for i in 0..rows {
        let income = if i % 3 == 0 { ">50K" } else { "<=50K" };
        out.push_str(&format!(
            "{},{},{}\n",
            20 + (i * 7) % 50,
            EDUCATION[i % EDUCATION.len()],
            income
        ));
    }
    out
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Adult {
    pub age: i64,
    pub education: String,
    pub income: String,
}

impl Record for Adult {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("age", DataType::Int64, false),
            Field::new("education", DataType::Utf8, false),
            Field::new("income", DataType::Utf8, false),
        ])
    }
}
