//! In-memory SQL Server fleet for driving the engine end to end.
//!
//! Behaviour is configured per instance (discovery), per scope (open
//! failures and panics), and per script SQL text, optionally narrowed to
//! one database. Every call is recorded in [`Stats`].

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sqlsweep_core::{Credentials, Instance, QueryCatalog};
use sqlsweep_db::{Connection, ConnectionFactory, DbError, IsolationLevel, Transaction};
use sqlsweep_worker::Orchestrator;

pub const DISCOVERY_SQL: &str = "SELECT name FROM sys.databases";

/// `(instance, database)`; `None` is the discovery scope.
pub type Scope = (String, Option<String>);

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptBehavior {
    Succeed(u64),
    FailExecute,
    FailCommit,
    Panic,
}

#[derive(Default)]
pub struct Stats {
    pub opens: Mutex<Vec<Scope>>,
    pub closes: Mutex<HashMap<Scope, usize>>,
    /// `(instance, database, sql)` for every executed batch.
    pub executed: Mutex<Vec<(String, String, String)>>,
    pub commits: Mutex<Vec<(String, String, String)>>,
    pub discovery_queries: Mutex<Vec<(String, String)>>,
}

impl Stats {
    pub fn opens(&self) -> Vec<Scope> {
        self.opens.lock().unwrap().clone()
    }

    pub fn close_count(&self, instance: &str, database: Option<&str>) -> usize {
        self.closes
            .lock()
            .unwrap()
            .get(&scope(instance, database))
            .copied()
            .unwrap_or(0)
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, sql)| sql.clone())
            .collect()
    }
}

pub fn scope(instance: &str, database: Option<&str>) -> Scope {
    (instance.to_string(), database.map(str::to_string))
}

pub struct FakeFleet {
    discovery: HashMap<String, Result<Vec<String>, String>>,
    open_failures: HashSet<Scope>,
    open_panics: HashSet<Scope>,
    begin_failures: HashSet<Scope>,
    scripts: HashMap<String, ScriptBehavior>,
    per_database: HashMap<(String, String), ScriptBehavior>,
    delays: HashMap<String, Duration>,
    pub stats: Arc<Stats>,
}

impl FakeFleet {
    pub fn new() -> Self {
        Self {
            discovery: HashMap::new(),
            open_failures: HashSet::new(),
            open_panics: HashSet::new(),
            begin_failures: HashSet::new(),
            scripts: HashMap::new(),
            per_database: HashMap::new(),
            delays: HashMap::new(),
            stats: Arc::new(Stats::default()),
        }
    }

    /// `instance` reports these databases.
    pub fn instance(mut self, instance: &str, databases: &[&str]) -> Self {
        self.discovery.insert(
            instance.to_string(),
            Ok(databases.iter().map(|d| d.to_string()).collect()),
        );
        self
    }

    /// The discovery query on `instance` fails.
    pub fn discovery_fails(mut self, instance: &str) -> Self {
        self.discovery
            .insert(instance.to_string(), Err("login has no VIEW ANY DATABASE".into()));
        self
    }

    pub fn open_fails(mut self, instance: &str, database: Option<&str>) -> Self {
        self.open_failures.insert(scope(instance, database));
        self
    }

    pub fn open_panics(mut self, instance: &str, database: Option<&str>) -> Self {
        self.open_panics.insert(scope(instance, database));
        self
    }

    /// Every transaction on this database fails to begin.
    pub fn begin_fails(mut self, instance: &str, database: &str) -> Self {
        self.begin_failures.insert(scope(instance, Some(database)));
        self
    }

    /// Behaviour of the script whose body is `sql`, on every database.
    pub fn script(mut self, sql: &str, behavior: ScriptBehavior) -> Self {
        self.scripts.insert(sql.to_string(), behavior);
        self
    }

    /// Behaviour of `sql` on one database only.
    pub fn script_on(mut self, database: &str, sql: &str, behavior: ScriptBehavior) -> Self {
        self.per_database
            .insert((database.to_string(), sql.to_string()), behavior);
        self
    }

    /// Hold `sql` in its execute step for `delay`.
    pub fn delay(mut self, sql: &str, delay: Duration) -> Self {
        self.delays.insert(sql.to_string(), delay);
        self
    }

    fn behavior(&self, database: &str, sql: &str) -> ScriptBehavior {
        self.per_database
            .get(&(database.to_string(), sql.to_string()))
            .or_else(|| self.scripts.get(sql))
            .copied()
            .unwrap_or(ScriptBehavior::Succeed(1))
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

pub struct FakeFactory(pub Arc<FakeFleet>);

#[async_trait]
impl ConnectionFactory for FakeFactory {
    async fn open(
        &self,
        instance: &Instance,
        database: Option<&str>,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>, DbError> {
        let scope = scope(instance.as_str(), database);
        self.0.stats.opens.lock().unwrap().push(scope.clone());

        if self.0.open_panics.contains(&scope) {
            panic!("driver crashed opening {scope:?}");
        }
        if self.0.open_failures.contains(&scope) {
            return Err(DbError::Connect {
                target: instance.to_string(),
                reason: "connection refused".into(),
            });
        }

        Ok(Arc::new(FakeConnection {
            fleet: Arc::clone(&self.0),
            scope,
        }))
    }
}

pub struct FakeConnection {
    fleet: Arc<FakeFleet>,
    scope: Scope,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn Transaction>, DbError> {
        assert_eq!(isolation, IsolationLevel::ReadCommitted);
        if self.fleet.begin_failures.contains(&self.scope) {
            return Err(DbError::Driver("session is in an uncommittable state".into()));
        }
        let (instance, database) = self.scope.clone();
        let database = database.expect("scripts only run in database scope");
        Ok(Box::new(FakeTransaction {
            fleet: Arc::clone(&self.fleet),
            instance,
            database,
            sql: None,
        }))
    }

    async fn query_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        let instance = self.scope.0.clone();
        self.fleet
            .stats
            .discovery_queries
            .lock()
            .unwrap()
            .push((instance.clone(), sql.to_string()));

        match self.fleet.discovery.get(&instance) {
            Some(Ok(names)) => Ok(names.clone()),
            Some(Err(reason)) => Err(DbError::Driver(reason.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&self) -> Result<(), DbError> {
        *self
            .fleet
            .stats
            .closes
            .lock()
            .unwrap()
            .entry(self.scope.clone())
            .or_default() += 1;
        Ok(())
    }
}

pub struct FakeTransaction {
    fleet: Arc<FakeFleet>,
    instance: String,
    database: String,
    sql: Option<String>,
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        self.sql = Some(sql.to_string());

        if let Some(delay) = self.fleet.delays.get(sql) {
            tokio::time::sleep(*delay).await;
        }

        self.fleet.stats.executed.lock().unwrap().push((
            self.instance.clone(),
            self.database.clone(),
            sql.to_string(),
        ));

        match self.fleet.behavior(&self.database, sql) {
            ScriptBehavior::Succeed(rows) => Ok(rows),
            ScriptBehavior::FailCommit => Ok(0),
            ScriptBehavior::FailExecute => Err(DbError::Driver(format!(
                "Invalid object name in '{sql}'"
            ))),
            ScriptBehavior::Panic => panic!("driver crashed running '{sql}'"),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let sql = self.sql.clone().unwrap_or_default();
        if self.fleet.behavior(&self.database, &sql) == ScriptBehavior::FailCommit {
            return Err(DbError::Driver("transaction log is full".into()));
        }
        self.fleet.stats.commits.lock().unwrap().push((
            self.instance.clone(),
            self.database.clone(),
            sql,
        ));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Catalog with the discovery script plus `(name, sql)` maintenance entries.
pub fn catalog(scripts: &[(&str, &str)]) -> Arc<QueryCatalog> {
    let mut entries = vec![("database".to_string(), DISCOVERY_SQL.to_string())];
    entries.extend(scripts.iter().map(|(n, s)| (n.to_string(), s.to_string())));
    Arc::new(QueryCatalog::from_entries("database", entries).unwrap())
}

pub fn orchestrator(fleet: FakeFleet, catalog: Arc<QueryCatalog>) -> (Orchestrator, Arc<Stats>) {
    let stats = Arc::clone(&fleet.stats);
    let orchestrator = Orchestrator::new(
        Arc::new(FakeFactory(Arc::new(fleet))),
        catalog,
        Credentials::new("sweeper", "secret"),
    );
    (orchestrator, stats)
}

pub fn instances(names: &[&str]) -> Vec<Instance> {
    names.iter().copied().map(Instance::new).collect()
}
