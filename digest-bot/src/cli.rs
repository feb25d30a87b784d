use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "digest-bot", version, about = "Telegram bot that summarizes recent chat history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Bot token; overrides BOT_TOKEN
        #[arg(long)]
        token: Option<String>,
    },
}
