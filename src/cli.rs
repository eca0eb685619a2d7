use clap::{Parser, Subcommand};

/// mgestats — duel statistics site
#[derive(Parser)]
#[command(name = "mgestats", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the public web frontend
    ServeWeb {
        /// Port to bind
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Start the data API
    ServeApi {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}
