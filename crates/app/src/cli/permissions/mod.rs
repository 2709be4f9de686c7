use clap::{Args, Subcommand};

mod initialize;

#[derive(Debug, Args)]
pub(crate) struct PermissionsCommand {
    #[command(subcommand)]
    command: PermissionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PermissionsSubcommand {
    Initialize(initialize::InitializePermissionsArgs),
}

pub(crate) async fn run(command: PermissionsCommand) -> Result<(), String> {
    match command.command {
        PermissionsSubcommand::Initialize(args) => initialize::run(args).await,
    }
}
