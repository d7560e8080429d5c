use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::Theme;
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://safety_tracker.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted theme preference.
    ShowTheme,
    /// Persist a theme preference (light or dark).
    SetTheme { theme: String },
    /// Verify the preference database answers queries.
    HealthCheck,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ShowTheme => match storage.load_theme().await? {
            Some(theme) => println!("theme={}", theme.as_str()),
            None => println!("theme is not set"),
        },
        Command::SetTheme { theme } => {
            let Some(theme) = Theme::parse(&theme) else {
                anyhow::bail!("unknown theme '{theme}', expected 'light' or 'dark'");
            };
            storage.save_theme(theme).await?;
            println!("theme={}", theme.as_str());
        }
        Command::HealthCheck => {
            storage.health_check().await?;
            println!("ok");
        }
    }

    Ok(())
}
