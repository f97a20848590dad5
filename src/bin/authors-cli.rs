use clap::{Parser, Subcommand};

use authors_gate::client::{BridgeClient, DEFAULT_ORIGIN_HEADER, DEFAULT_ORIGIN_VALUE};

#[derive(Parser)]
#[command(name = "authors-cli")]
#[command(about = "Bridge client for the authors API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(long, default_value = DEFAULT_ORIGIN_HEADER)]
    origin_header: String,

    #[arg(long, default_value = DEFAULT_ORIGIN_VALUE)]
    origin_value: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a token and report whether one was issued
    Token,
    /// List all authors
    List,
    /// Create an author
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = BridgeClient::new(&cli.url)?.origin(cli.origin_header, cli.origin_value);

    match cli.command {
        Commands::Token => {
            client.fetch_token().await?;
            let len = client.token().map_or(0, str::len);
            println!("Token issued ({} characters)", len);
        }
        Commands::List => {
            let authors = client.list_authors().await?;
            println!("{}", serde_json::to_string_pretty(&authors)?);
        }
        Commands::Create { name, bio } => {
            let author = client.create_author(&name, &bio).await?;
            println!("{}", serde_json::to_string_pretty(&author)?);
        }
    }

    Ok(())
}
