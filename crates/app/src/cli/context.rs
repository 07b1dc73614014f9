use std::{fs, io, path::Path, sync::Arc};

use clap::Args;
use quarry_app::{
    catalog::PgCatalogReader,
    config::{DatabaseConfig, IntakeConfig},
    database::{self, Db},
    domain::orders::{
        OrderIntakeService, OrdersServiceError, PgOrdersStore, data::CreateOrder,
    },
    notifications::PgNotificationSink,
};
use serde::Serialize;

/// Connection and intake settings shared by every order command.
#[derive(Debug, Args)]
pub(crate) struct ServiceArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    intake: IntakeConfig,
}

impl ServiceArgs {
    pub(crate) async fn service(&self) -> Result<OrderIntakeService, String> {
        let policy = self
            .intake
            .load_policy()
            .map_err(|error| format!("failed to load pricing policy: {error}"))?;

        let pool = database::connect(&self.database.database_url)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let db = Db::new(pool);

        Ok(OrderIntakeService::new(
            Arc::new(PgOrdersStore::new(db.clone())),
            Arc::new(PgCatalogReader::new(db.clone())),
            Arc::new(PgNotificationSink::new(db)),
            policy,
            self.intake.settings(),
        ))
    }
}

/// Read a JSON order request from a file, or stdin when the path is `-`.
pub(crate) fn read_request(path: &Path) -> Result<CreateOrder, String> {
    let json = if path == Path::new("-") {
        io::read_to_string(io::stdin())
    } else {
        fs::read_to_string(path)
    }
    .map_err(|error| format!("failed to read request {}: {error}", path.display()))?;

    serde_json::from_str(&json).map_err(|error| format!("invalid order request: {error}"))
}

/// Describe a service error for the terminal, including the shortfall for
/// missed minimums and a hint when retrying may help.
pub(crate) fn describe(action: &str, error: &OrdersServiceError) -> String {
    let mut message = format!("failed to {action}: {error}");

    if let OrdersServiceError::MinimumOrderNotMet(shortfall) = error
        && let Ok(json) = serde_json::to_string(shortfall)
    {
        message.push_str(&format!(" {json}"));
    }

    if error.is_retryable() {
        message.push_str(" (retryable)");
    }

    message
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to encode output: {error}"))?;

    #[expect(clippy::print_stdout, reason = "command output goes to stdout")]
    {
        println!("{json}");
    }

    Ok(())
}
