use clap::{Args, Subcommand};

mod purge;
mod resolve;

#[derive(Debug, Args)]
pub(crate) struct DirectoryCommand {
    #[command(subcommand)]
    command: DirectorySubcommand,
}

#[derive(Debug, Subcommand)]
enum DirectorySubcommand {
    Purge(purge::PurgeDirectoryArgs),
    Resolve(resolve::ResolveIdentityArgs),
}

pub(crate) async fn run(command: DirectoryCommand) -> Result<(), String> {
    match command.command {
        DirectorySubcommand::Purge(args) => purge::run(args).await,
        DirectorySubcommand::Resolve(args) => resolve::run(args).await,
    }
}
