use clap::Args;
use quarry::fulfillment::DeliveryStatus;
use quarry_app::domain::orders::{
    OrdersService,
    data::StatusUpdate,
    records::{DriverUuid, OrderUuid, VehicleUuid},
};

use super::context::{ServiceArgs, describe, print_json};

#[derive(Debug, Args)]
pub(crate) struct AdvanceDeliveryArgs {
    /// Order UUID
    order: OrderUuid,

    /// New delivery status (Pending, Preparing, OutForDelivery, Delivered, Cancelled)
    status: DeliveryStatus,

    /// Assign a driver
    #[arg(long)]
    driver: Option<DriverUuid>,

    /// Assign a vehicle
    #[arg(long)]
    vehicle: Option<VehicleUuid>,

    #[command(flatten)]
    service: ServiceArgs,
}

pub(crate) async fn run(args: AdvanceDeliveryArgs) -> Result<(), String> {
    let service = args.service.service().await?;

    let updated = service
        .update_status(
            args.order,
            StatusUpdate::Delivery {
                status: args.status,
                driver: args.driver,
                vehicle: args.vehicle,
            },
        )
        .await
        .map_err(|error| describe("update delivery status", &error))?;

    print_json(&updated)
}
