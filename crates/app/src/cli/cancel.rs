use clap::Args;
use quarry_app::domain::orders::{OrdersService, data::StatusUpdate, records::OrderUuid};

use super::context::{ServiceArgs, describe, print_json};

#[derive(Debug, Args)]
pub(crate) struct CancelArgs {
    /// Order UUID
    order: OrderUuid,

    #[command(flatten)]
    service: ServiceArgs,
}

pub(crate) async fn run(args: CancelArgs) -> Result<(), String> {
    let service = args.service.service().await?;

    let updated = service
        .update_status(args.order, StatusUpdate::Cancel)
        .await
        .map_err(|error| describe("cancel order", &error))?;

    print_json(&updated)
}
