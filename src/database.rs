//! Entry point: wrap a driver and get back a logged database handle.

use std::sync::Arc;

use crate::connection::LoggedConnection;
use crate::connector::LoggingConnector;
use crate::driver::{Connector, Context, Driver};
use crate::error::{ConfigError, DriverResult};
use crate::logger::{LogPolicy, Logger};
use crate::options::Options;

/// A logged database handle.
///
/// Cheap to clone; clones share one connector and one policy. Pooling is
/// left to the host, which obtains connections through [`Database::connector`]
/// or [`Database::connect`].
#[derive(Clone)]
pub struct Database {
    connector: Arc<LoggingConnector>,
}

impl Database {
    /// Open a new decorated connection.
    pub fn connect(&self, ctx: &Context) -> DriverResult<LoggedConnection> {
        self.connector.connect_logged(ctx)
    }

    /// The connector a host pool should call into.
    pub fn connector(&self) -> Arc<dyn Connector> {
        self.connector.clone()
    }

    /// The undecorated driver.
    pub fn driver(&self) -> Arc<dyn Driver> {
        self.connector.driver()
    }

    pub fn options(&self) -> &Options {
        self.connector.policy().options()
    }
}

/// Wrap `driver` so every call made through the returned handle is logged
/// to `logger`.
///
/// # Errors
/// Fails only when `opt` has no ID generator and the default one cannot be
/// seeded from the operating system.
///
/// # Example
///
/// ```ignore
/// let db = open_driver(
///     "file:app.db",
///     Arc::new(MyDriver),
///     Arc::new(TracingAdapter::new()),
///     Options::default().with_minimum_level(Level::Info),
/// )?;
/// let mut conn = db.connect(&Context::background())?;
/// ```
pub fn open_driver(
    dsn: impl Into<String>,
    driver: Arc<dyn Driver>,
    logger: Arc<dyn Logger>,
    opt: Options,
) -> Result<Database, ConfigError> {
    let policy = Arc::new(LogPolicy::new(logger, opt)?);
    Ok(Database {
        connector: Arc::new(LoggingConnector::new(dsn, driver, policy)),
    })
}
