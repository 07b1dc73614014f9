use clap::Args;
use quarry_app::domain::orders::{OrdersService, records::OrderUuid};

use super::context::{ServiceArgs, describe, print_json};

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    /// Order UUID
    order: OrderUuid,

    #[command(flatten)]
    service: ServiceArgs,
}

pub(crate) async fn run(args: ShowArgs) -> Result<(), String> {
    let service = args.service.service().await?;

    let details = service
        .get_order(args.order)
        .await
        .map_err(|error| describe("show order", &error))?;

    print_json(&details)
}
