use std::path::PathBuf;

use clap::Args;
use quarry_app::domain::orders::OrdersService;

use super::context::{ServiceArgs, describe, print_json, read_request};

#[derive(Debug, Args)]
pub(crate) struct CreateArgs {
    /// JSON order request; `-` reads stdin
    #[arg(long)]
    request: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

pub(crate) async fn run(args: CreateArgs) -> Result<(), String> {
    let request = read_request(&args.request)?;
    let service = args.service.service().await?;

    let created = service
        .create_order(request)
        .await
        .map_err(|error| describe("create order", &error))?;

    print_json(&created)
}
