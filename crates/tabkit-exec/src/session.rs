//! `Session`: loader entry point, view catalog and SQL front door.
//!
//! The catalog maps case-folded view names to shared tables behind a single
//! `RwLock`. Registering a name again replaces the previous binding.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tabkit_core::config::{LoadOptions, SessionConfig};
use tabkit_core::dag::LogicalPlan;
use tabkit_core::table::Table;
use tabkit_io::{MemoryStorage, Resolver};
use tracing::{debug, info};

use crate::dataframe::DataFrame;
use crate::error::{ExecError, Result};
use crate::runtime;

#[derive(Debug)]
struct View {
    /// Name as last registered, for listing.
    name: String,
    table: Arc<Table>,
}

#[derive(Debug)]
pub struct Session {
    config: Arc<SessionConfig>,
    resolver: Resolver,
    views: RwLock<HashMap<String, View>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn view_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            resolver: Resolver::new(&config),
            config: Arc::new(config),
            views: RwLock::new(HashMap::new()),
        }
    }

    /// Session configured from `TABKIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(SessionConfig::from_env())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Backing store for `memory://` locations.
    pub fn memory(&self) -> &MemoryStorage {
        self.resolver.memory()
    }

    fn read_views(&self) -> RwLockReadGuard<'_, HashMap<String, View>> {
        self.views.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_views(&self) -> RwLockWriteGuard<'_, HashMap<String, View>> {
        self.views.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spark-style reader: `session.read().option("header", "true").load(path)`.
    pub fn read(&self) -> DataFrameReader<'_> {
        DataFrameReader {
            session: self,
            options: LoadOptions::default(),
            error: None,
        }
    }

    /// Load `location` into a `DataFrame`.
    pub fn load(&self, location: &str, options: &LoadOptions) -> Result<DataFrame> {
        let table = tabkit_io::load(&self.resolver, location, options)?;
        Ok(self.dataframe_from(Arc::new(table)))
    }

    /// Wrap an existing table with this session's configuration.
    pub fn dataframe(&self, table: Table) -> DataFrame {
        self.dataframe_from(Arc::new(table))
    }

    fn dataframe_from(&self, table: Arc<Table>) -> DataFrame {
        DataFrame::from_parts(table, Arc::clone(&self.config))
    }

    /// Bind `name` to the frame's table, replacing any previous binding.
    pub fn register_view(&self, name: &str, df: &DataFrame) {
        let replaced = self
            .write_views()
            .insert(
                view_key(name),
                View {
                    name: name.to_string(),
                    table: df.shared_table(),
                },
            )
            .is_some();
        info!(view = name, rows = df.count(), replaced, "registered view");
    }

    pub fn create_or_replace_temp_view(&self, name: &str, df: &DataFrame) {
        self.register_view(name, df);
    }

    pub fn table(&self, name: &str) -> Result<DataFrame> {
        Ok(self.dataframe_from(self.lookup(name)?))
    }

    fn lookup(&self, name: &str) -> Result<Arc<Table>> {
        self.read_views()
            .get(&view_key(name))
            .map(|v| Arc::clone(&v.table))
            .ok_or_else(|| ExecError::UnknownView(name.to_string()))
    }

    /// Remove a binding; `false` if there was none.
    pub fn drop_view(&self, name: &str) -> bool {
        self.write_views().remove(&view_key(name)).is_some()
    }

    /// Registered names, sorted.
    pub fn view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_views().values().map(|v| v.name.clone()).collect();
        names.sort();
        names
    }

    /// Run a query against the registered views.
    pub fn sql(&self, query: &str) -> Result<DataFrame> {
        let plan = tabkit_planner::plan_sql(query)?;
        debug!(query, "planned query");
        self.execute(&plan)
    }

    /// Execute an already-parsed plan.
    pub fn execute(&self, plan: &LogicalPlan) -> Result<DataFrame> {
        let source = self.lookup(plan.source_view())?;
        let out = runtime::execute(plan, source, self.config.partition_rows)?;
        Ok(self.dataframe_from(out))
    }

    /// Optimized plan for `query`, one node per line.
    pub fn explain(&self, query: &str) -> Result<String> {
        Ok(tabkit_planner::plan_sql(query)?.to_string())
    }
}

/// Builder returned by `Session::read`. Option errors are reported by `load`.
pub struct DataFrameReader<'a> {
    session: &'a Session,
    options: LoadOptions,
    error: Option<tabkit_core::Error>,
}

impl<'a> DataFrameReader<'a> {
    pub fn format(self, format: &str) -> Self {
        self.option("format", format)
    }

    pub fn option(mut self, key: &str, value: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.options.set(key, value) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn load(self, location: &str) -> Result<DataFrame> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        self.session.load(location, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkit_core::types::Scalar;

    const ADULT: &str = "age,education,income\n39,Bachelors,<=50K\n50,Masters,>50K\n38,Bachelors,>50K";

    fn session() -> Session {
        let s = Session::default();
        s.memory().insert("adult.csv", ADULT);
        s
    }

    #[test]
    fn reader_options_and_views() {
        let s = session();
        let df = s
            .read()
            .format("csv")
            .option("header", "true")
            .option("inferSchema", "false")
            .load("memory://adult.csv")
            .unwrap();
        assert_eq!(df.count(), 3);

        s.create_or_replace_temp_view("adult_csv", &df);
        assert_eq!(s.table("ADULT_CSV").unwrap().count(), 3);
        assert_eq!(s.view_names(), vec!["adult_csv"]);
        assert!(s.drop_view("Adult_Csv"));
        assert!(!s.drop_view("adult_csv"));
        assert!(matches!(s.table("adult_csv"), Err(ExecError::UnknownView(_))));
    }

    #[test]
    fn bad_option_surfaces_on_load() {
        let err = session()
            .read()
            .option("header", "maybe")
            .load("memory://adult.csv")
            .unwrap_err();
        assert!(matches!(err, ExecError::Core(tabkit_core::Error::Config(_))));
    }

    #[test]
    fn sql_and_explain() {
        let s = session();
        let df = s.load("memory://adult.csv", &LoadOptions::csv().with_header(true)).unwrap();
        s.register_view("adult_csv", &df);

        let all = s.sql("select * from `adult_csv`").unwrap();
        assert_eq!(all.count(), 3);

        let grouped = s
            .sql("SELECT education, COUNT(*) FROM adult_csv WHERE income = '>50K' GROUP BY education")
            .unwrap();
        assert_eq!(grouped.collect()[0][1], Scalar::Int(1));

        let plan = s.explain("SELECT * FROM adult_csv WHERE age > 30 LIMIT 1").unwrap();
        assert_eq!(plan, "Limit: 1\n  Filter: age > 30\n    Scan: adult_csv\n");

        assert!(matches!(s.sql("select * from nope"), Err(ExecError::UnknownView(v)) if v == "nope"));
        assert!(matches!(s.sql("select from"), Err(ExecError::Query(_))));
    }

    #[test]
    fn missing_resource() {
        let err = session()
            .load("memory://missing.csv", &LoadOptions::csv())
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Load(tabkit_io::Error::ResourceNotFound { .. })
        ));
    }
}
