//! Connector: opens driver connections and hands back decorated ones.

use std::sync::Arc;

use crate::connection::LoggedConnection;
use crate::driver::{Conn, Connector, Context, Driver};
use crate::error::DriverResult;
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;

pub struct LoggingConnector {
    dsn: String,
    driver: Arc<dyn Driver>,
    policy: Arc<LogPolicy>,
}

impl LoggingConnector {
    pub fn new(dsn: impl Into<String>, driver: Arc<dyn Driver>, policy: Arc<LogPolicy>) -> Self {
        Self {
            dsn: dsn.into(),
            driver,
            policy,
        }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn policy(&self) -> &Arc<LogPolicy> {
        &self.policy
    }

    /// Open and wrap a connection, keeping the concrete decorator type.
    ///
    /// A failed open is logged at error and returned as the driver produced
    /// it. On success the connection gets a fresh ID, logged with the
    /// connect event.
    pub fn connect_logged(&self, ctx: &Context) -> DriverResult<LoggedConnection> {
        let start = CallStart::now();
        let opened = self.driver.open(&self.dsn);
        if opened.is_err() {
            self.policy
                .log_outcome(ctx, Message::Connect, start, &opened, &[]);
        }
        let conn = opened?;

        let id = self.policy.unique_id();
        self.policy.log_outcome(
            ctx,
            Message::Connect,
            start,
            &Ok::<(), _>(()),
            &[Field::ConnId(&id)],
        );
        Ok(LoggedConnection::new(conn, self.policy.clone(), id))
    }
}

impl Connector for LoggingConnector {
    fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        Ok(Box::new(self.connect_logged(ctx)?))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        self.driver.clone()
    }
}
