use std::sync::Arc;

use sqlsweep_core::{Credentials, QueryCatalog};
use sqlsweep_db::ConnectionFactory;

/// Read-only inputs shared by every runner in a run.
pub struct RunContext {
    pub factory: Arc<dyn ConnectionFactory>,
    pub catalog: Arc<QueryCatalog>,
    pub credentials: Credentials,
}

impl RunContext {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        catalog: Arc<QueryCatalog>,
        credentials: Credentials,
    ) -> Self {
        Self {
            factory,
            catalog,
            credentials,
        }
    }
}
