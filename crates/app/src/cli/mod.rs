use clap::{Parser, Subcommand};
use quarry_app::{config::LoggingConfig, observability};

mod advance_delivery;
mod advance_order;
mod cancel;
mod context;
mod create;
mod migrate;
mod quote;
mod show;

#[derive(Debug, Parser)]
#[command(name = "quarry", about = "Quarry order intake CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),

    /// Price an order request without placing it
    Quote(quote::QuoteArgs),

    /// Place an order
    Create(create::CreateArgs),

    /// Show an order with its fulfillment stage
    Show(show::ShowArgs),

    /// Move an order to a new order status
    AdvanceOrder(advance_order::AdvanceOrderArgs),

    /// Move an order's delivery to a new delivery status
    AdvanceDelivery(advance_delivery::AdvanceDeliveryArgs),

    /// Reject an order and cancel its delivery
    Cancel(cancel::CancelArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        match self.command {
            Commands::Migrate(args) => migrate::run(args).await,
            Commands::Quote(args) => quote::run(args).await,
            Commands::Create(args) => create::run(args).await,
            Commands::Show(args) => show::run(args).await,
            Commands::AdvanceOrder(args) => advance_order::run(args).await,
            Commands::AdvanceDelivery(args) => advance_delivery::run(args).await,
            Commands::Cancel(args) => cancel::run(args).await,
        }
    }
}
