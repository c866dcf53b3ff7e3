use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snowpass::{
    KEYRING_SERVICE, KeyringBackend, SessionCache, SessionContext, Snowpass, Terminal,
    default_data_dir,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type Vault = Snowpass<KeyringBackend, Terminal>;

#[derive(Debug, Parser)]
#[command(name = "snowpass")]
#[command(
    version,
    about = "Local encrypted credential store with password-protected keystores."
)]
struct Cli {
    /// Directory holding the keystore files
    #[arg(long, global = true, value_name = "PATH", env = "SNOWPASS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Always prompt for the master password and never cache it
    #[arg(long, global = true, env = "SNOWPASS_NO_SESSION")]
    no_session: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Creates a keystore to store data in
    #[command(arg_required_else_help = true)]
    Create { keystore: String },

    /// Adds an entry to a keystore
    #[command(arg_required_else_help = true)]
    Add {
        identifier: String,
        #[arg(value_name = "to", value_parser = ["to"])]
        _to: String,
        keystore: String,
    },

    /// Prints the data stored for an identifier
    #[command(arg_required_else_help = true)]
    Get {
        identifier: String,
        #[arg(value_name = "from", value_parser = ["from"])]
        _from: String,
        keystore: String,
    },

    /// Copies the data stored for an identifier to the clipboard
    #[command(arg_required_else_help = true)]
    Copy {
        identifier: String,
        #[arg(value_name = "from", value_parser = ["from"])]
        _from: String,
        keystore: String,
    },

    /// Replaces the data of an existing identifier
    #[command(arg_required_else_help = true)]
    Edit {
        identifier: String,
        #[arg(value_name = "in", value_parser = ["in"])]
        _in: String,
        keystore: String,
    },

    /// Deletes an identifier and its data from a keystore
    #[command(arg_required_else_help = true)]
    Delete {
        identifier: String,
        #[arg(value_name = "from", value_parser = ["from"])]
        _from: String,
        keystore: String,
    },

    /// Deletes a keystore entirely
    #[command(arg_required_else_help = true)]
    DeleteKeystore { keystore: String },

    /// Changes the master password of a keystore
    #[command(arg_required_else_help = true)]
    ChangePassword { keystore: String },

    /// Lists the identifiers of one keystore, or of all keystores
    List {
        /// Keystore name, or `all`
        #[arg(value_name = "KEYSTORE|all")]
        target: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SNOWPASS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_data_dir(path: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match path {
        Some(p) => p,
        None => default_data_dir()?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

fn context(vault: &Vault, keystore: &str, no_session: bool) -> Result<SessionContext> {
    let ctx = vault.context(keystore)?;
    Ok(if no_session { ctx.without_session() } else { ctx })
}

fn print_identifiers(identifiers: &[String]) {
    for identifier in identifiers {
        println!("    ├── {identifier}");
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Cli::parse();
    let data_dir = resolve_data_dir(args.data_dir)?;
    let mut vault = Snowpass::new(
        data_dir,
        SessionCache::new(KeyringBackend::new(KEYRING_SERVICE)),
        Terminal,
    );
    let no_session = args.no_session;

    match args.command {
        Commands::Create { keystore } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.create(&ctx)?;
            println!("Keystore '{keystore}' created.");
        }
        Commands::Add {
            identifier,
            keystore,
            ..
        } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.add(&ctx, &identifier)?;
            println!("Stored '{identifier}' in '{keystore}'.");
        }
        Commands::Get {
            identifier,
            keystore,
            ..
        } => {
            let ctx = context(&vault, &keystore, no_session)?;
            let value = vault.get(&ctx, &identifier)?;
            println!("{}", value.as_str());
        }
        Commands::Copy {
            identifier,
            keystore,
            ..
        } => {
            let ctx = context(&vault, &keystore, no_session)?;
            let value = vault.get(&ctx, &identifier)?;
            arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.set_text(value.as_str()))
                .context("failed to copy to clipboard")?;
            println!("Data copied to clipboard!");
        }
        Commands::Edit {
            identifier,
            keystore,
            ..
        } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.edit(&ctx, &identifier)?;
            println!("Updated '{identifier}' in '{keystore}'.");
        }
        Commands::Delete {
            identifier,
            keystore,
            ..
        } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.delete(&ctx, &identifier)?;
            println!("Deleted '{identifier}' from '{keystore}'.");
        }
        Commands::DeleteKeystore { keystore } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.delete_keystore(&ctx)?;
            println!("Keystore deleted successfully!");
        }
        Commands::ChangePassword { keystore } => {
            let ctx = context(&vault, &keystore, no_session)?;
            vault.change_password(&ctx)?;
            println!("Master password changed successfully.");
        }
        Commands::List { target } => match target.as_deref() {
            None | Some("all") => {
                let listings = vault.list_all()?;
                if listings.is_empty() {
                    println!("No keystores found in {}", vault.data_dir().display());
                }
                for listing in listings {
                    println!("└── {}", listing.name);
                    match listing.identifiers {
                        Ok(identifiers) => print_identifiers(&identifiers),
                        Err(e) => println!("    (failed to load index: {e})"),
                    }
                }
            }
            Some(keystore) => {
                let identifiers = vault.list(keystore)?;
                println!("└── {keystore}");
                print_identifiers(&identifiers);
            }
        },
    }

    Ok(())
}
