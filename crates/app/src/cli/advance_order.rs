use clap::Args;
use quarry::fulfillment::OrderStatus;
use quarry_app::domain::orders::{OrdersService, data::StatusUpdate, records::OrderUuid};

use super::context::{ServiceArgs, describe, print_json};

#[derive(Debug, Args)]
pub(crate) struct AdvanceOrderArgs {
    /// Order UUID
    order: OrderUuid,

    /// New order status (WaitingPayment, Processing, Ready, Completed, Rejected)
    status: OrderStatus,

    /// Payment method, recorded when the order leaves WaitingPayment
    #[arg(long)]
    payment_method: Option<String>,

    #[command(flatten)]
    service: ServiceArgs,
}

pub(crate) async fn run(args: AdvanceOrderArgs) -> Result<(), String> {
    let service = args.service.service().await?;

    let updated = service
        .update_status(
            args.order,
            StatusUpdate::Order {
                status: args.status,
                payment_method: args.payment_method,
            },
        )
        .await
        .map_err(|error| describe("update order status", &error))?;

    print_json(&updated)
}
