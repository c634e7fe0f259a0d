//! SQL Server connections over TDS.
//!
//! One `TdsConnection` is one TDS session. A session can run only one
//! transaction at a time, so a `TdsTransaction` holds the session lock
//! from `BEGIN` until it is committed or dropped. Sibling scripts sharing a
//! connection therefore queue on the session but never share a
//! transaction.
//!
//! Every session runs with `XACT_ABORT ON`, which rolls back on runtime
//! errors. Compile and name-resolution errors do not abort the transaction,
//! so a failed script can leave one open on the session. Each `BEGIN` batch
//! therefore starts by rolling back whatever the previous script left
//! behind; the next script always starts at `@@TRANCOUNT = 0`.

use std::sync::Arc;

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use sqlsweep_core::{Credentials, Instance};

use crate::connection::{Connection, ConnectionFactory, IsolationLevel, Transaction, DEFAULT_PORT};
use crate::error::DbError;

type TdsClient = Client<Compat<TcpStream>>;

/// Session option applied right after login.
const ABORT_ON_ERROR: &str = "SET XACT_ABORT ON";

/// Column read from the discovery result set.
const NAME_COLUMN: &str = "name";

/// Batch that starts a script's transaction on a clean session.
fn begin_batch(isolation: IsolationLevel) -> String {
    format!(
        "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION; \
         SET TRANSACTION ISOLATION LEVEL {}; \
         BEGIN TRANSACTION",
        isolation.as_sql()
    )
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What a connection needs from a live TDS session.
#[async_trait]
pub(crate) trait Session: Send + 'static {
    /// Run a batch and discard its results.
    async fn batch(&mut self, sql: &str) -> Result<(), DbError>;

    /// Run `sql` and return the rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Run `sql` and read `column` from every row of the first result set.
    async fn column(&mut self, sql: &str, column: &str) -> Result<Vec<String>, DbError>;

    async fn close(self) -> Result<(), DbError>;
}

#[async_trait]
impl Session for TdsClient {
    async fn batch(&mut self, sql: &str) -> Result<(), DbError> {
        self.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = Client::execute(self, sql, &[]).await?;
        Ok(result.total())
    }

    async fn column(&mut self, sql: &str, column: &str) -> Result<Vec<String>, DbError> {
        let rows = self.simple_query(sql).await?.into_first_result().await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(value) = row.try_get::<&str, _>(column)? {
                values.push(value.to_string());
            }
        }
        Ok(values)
    }

    async fn close(self) -> Result<(), DbError> {
        Client::close(self).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Opens unencrypted SQL-authenticated TDS sessions.
#[derive(Debug, Clone)]
pub struct TdsConnectionFactory {
    port: u16,
}

impl TdsConnectionFactory {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    fn config(&self, instance: &Instance, database: Option<&str>, credentials: &Credentials) -> Config {
        let mut config = Config::new();
        config.host(instance.as_str());
        config.port(self.port);
        if let Some(database) = database {
            config.database(database);
        }
        config.authentication(AuthMethod::sql_server(
            &credentials.username,
            &credentials.password,
        ));
        config.encryption(EncryptionLevel::NotSupported);
        config
    }
}

impl Default for TdsConnectionFactory {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

#[async_trait]
impl ConnectionFactory for TdsConnectionFactory {
    async fn open(
        &self,
        instance: &Instance,
        database: Option<&str>,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>, DbError> {
        let target = match database {
            Some(database) => format!("{instance}/{database}"),
            None => instance.to_string(),
        };
        let connect_err = |reason: String| DbError::Connect {
            target: target.clone(),
            reason,
        };

        let config = self.config(instance, database, credentials);

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| connect_err(e.to_string()))?;
        tcp.set_nodelay(true)?;

        let mut client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connect_err(e.to_string()))?;

        Session::batch(&mut client, ABORT_ON_ERROR).await?;

        tracing::debug!(endpoint = %target, "TDS session opened");

        Ok(Arc::new(TdsConnection::new(client, target)))
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// An open TDS session. The session is `None` once closed.
pub(crate) struct TdsConnection<S = TdsClient> {
    session: Arc<Mutex<Option<S>>>,
    target: String,
}

impl<S: Session> TdsConnection<S> {
    fn new(session: S, target: String) -> Self {
        Self {
            session: Arc::new(Mutex::new(Some(session))),
            target,
        }
    }
}

#[async_trait]
impl<S: Session> Connection for TdsConnection<S> {
    async fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn Transaction>, DbError> {
        let mut guard = Arc::clone(&self.session).lock_owned().await;

        guard
            .as_mut()
            .ok_or(DbError::Closed)?
            .batch(&begin_batch(isolation))
            .await?;

        Ok(Box::new(TdsTransaction { guard }))
    }

    async fn query_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(DbError::Closed)?;
        session.column(sql, NAME_COLUMN).await
    }

    async fn close(&self) -> Result<(), DbError> {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => {
                session.close().await?;
                tracing::debug!(endpoint = %self.target, "TDS session closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction holding exclusive use of its session.
pub(crate) struct TdsTransaction<S = TdsClient> {
    guard: OwnedMutexGuard<Option<S>>,
}

#[async_trait]
impl<S: Session> Transaction for TdsTransaction<S> {
    async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        let session = self.guard.as_mut().ok_or(DbError::Closed)?;
        session.execute(sql).await
    }

    async fn commit(mut self: Box<Self>) -> Result<(), DbError> {
        let session = self.guard.as_mut().ok_or(DbError::Closed)?;
        session.batch("COMMIT TRANSACTION").await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::error::ScriptError;
    use crate::executor::QueryExecutor;

    #[test]
    fn config_targets_configured_port() {
        let factory = TdsConnectionFactory::new(14330);
        let config = factory.config(
            &Instance::new("db1.internal"),
            Some("client_a"),
            &Credentials::new("sweeper", "secret"),
        );
        assert_eq!(config.get_addr(), "db1.internal:14330");
    }

    #[test]
    fn default_factory_uses_standard_port() {
        let factory = TdsConnectionFactory::default();
        let config = factory.config(
            &Instance::new("db1.internal"),
            None,
            &Credentials::new("sweeper", "secret"),
        );
        assert_eq!(config.get_addr(), "db1.internal:1433");
    }

    #[test]
    fn isolation_level_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::Snapshot.as_sql(), "SNAPSHOT");
    }

    #[test]
    fn begin_batch_rolls_back_leftovers_first() {
        let batch = begin_batch(IsolationLevel::ReadCommitted);
        assert!(batch.starts_with("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION;"));
        assert!(batch.ends_with("BEGIN TRANSACTION"));
        assert!(batch.contains("SET TRANSACTION ISOLATION LEVEL READ COMMITTED;"));
    }

    // -----------------------------------------------------------------------
    // Fake session
    // -----------------------------------------------------------------------

    /// Server-side state of one session, tracked the way SQL Server does
    /// for nested `BEGIN` / `COMMIT`.
    #[derive(Default)]
    struct ServerState {
        trancount: u32,
        /// Statements run inside the open transaction.
        pending: Vec<String>,
        /// Statements made durable by an outermost commit.
        durable: Vec<String>,
    }

    /// Fails `execute` for `COMPILE_ERROR` without touching the open
    /// transaction, like a name-resolution error under `XACT_ABORT ON`.
    struct FakeSession(Arc<StdMutex<ServerState>>);

    const COMPILE_ERROR: &str = "UPDATE missing_table SET x = 1";

    #[async_trait]
    impl Session for FakeSession {
        async fn batch(&mut self, sql: &str) -> Result<(), DbError> {
            let mut state = self.0.lock().unwrap();
            for statement in sql.split(';').map(str::trim) {
                match statement {
                    "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION" => {
                        state.trancount = 0;
                        state.pending.clear();
                    }
                    "BEGIN TRANSACTION" => state.trancount += 1,
                    "COMMIT TRANSACTION" => {
                        state.trancount -= 1;
                        if state.trancount == 0 {
                            let pending = std::mem::take(&mut state.pending);
                            state.durable.extend(pending);
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        }

        async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
            if sql == COMPILE_ERROR {
                return Err(DbError::Driver("Invalid object name 'missing_table'".into()));
            }
            self.0.lock().unwrap().pending.push(sql.to_string());
            Ok(1)
        }

        async fn column(&mut self, _sql: &str, _column: &str) -> Result<Vec<String>, DbError> {
            Ok(Vec::new())
        }

        async fn close(self) -> Result<(), DbError> {
            Ok(())
        }
    }

    fn fake_connection() -> (TdsConnection<FakeSession>, Arc<StdMutex<ServerState>>) {
        let state = Arc::new(StdMutex::new(ServerState::default()));
        let connection = TdsConnection::new(FakeSession(Arc::clone(&state)), "fake".into());
        (connection, state)
    }

    #[tokio::test]
    async fn failed_script_does_not_swallow_the_next_one() {
        let (connection, state) = fake_connection();

        let failed = QueryExecutor::run(&connection, "broken", COMPILE_ERROR).await;
        assert_matches!(failed, Err(ScriptError::Execution(_)));
        assert_eq!(state.lock().unwrap().trancount, 1);

        let rows = QueryExecutor::run(&connection, "update", "UPDATE t SET x = 2")
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let state = state.lock().unwrap();
        assert_eq!(state.trancount, 0);
        assert_eq!(state.durable, vec!["UPDATE t SET x = 2".to_string()]);
    }

    #[tokio::test]
    async fn committed_scripts_are_each_durable() {
        let (connection, state) = fake_connection();

        QueryExecutor::run(&connection, "one", "UPDATE a SET x = 1").await.unwrap();
        QueryExecutor::run(&connection, "two", "UPDATE b SET x = 1").await.unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.trancount, 0);
        assert_eq!(state.durable.len(), 2);
    }

    #[tokio::test]
    async fn closed_session_refuses_new_transactions() {
        let (connection, _state) = fake_connection();

        connection.close().await.unwrap();
        connection.close().await.unwrap();

        assert_matches!(
            connection.begin(IsolationLevel::ReadCommitted).await.err(),
            Some(DbError::Closed)
        );
    }
}
