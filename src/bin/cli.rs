//! Roster CLI Client
//!
//! Command-line interface for interacting with a Roster server.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use roster::network::Client;
use roster::{Medal, NewTrainer, RosterError, Trainer, UpdateTrainer};

/// Roster CLI
#[derive(Parser, Debug)]
#[command(name = "roster-cli")]
#[command(about = "CLI for the Roster trainer service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a trainer by id
    Get {
        /// Trainer id
        id: String,
    },

    /// Create one or more trainers in a single stream
    Create {
        /// Trainer names; each gets the same age, birth date and medals
        #[arg(required = true)]
        names: Vec<String>,

        #[arg(short, long, default_value = "18")]
        age: i32,

        /// Birth date (RFC 3339)
        #[arg(short, long)]
        birth_date: Option<DateTime<Utc>>,

        /// Medal as region:tier, e.g. east:gold (repeatable)
        #[arg(short, long = "medal", value_parser = parse_medal)]
        medals: Vec<Medal>,
    },

    /// Overwrite a trainer
    Update {
        /// Trainer id
        id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        age: i32,

        /// Birth date (RFC 3339)
        #[arg(short, long)]
        birth_date: Option<DateTime<Utc>>,

        /// Medal as region:tier, e.g. east:gold (repeatable)
        #[arg(short, long = "medal", value_parser = parse_medal)]
        medals: Vec<Medal>,
    },

    /// Delete a trainer by id
    Delete {
        /// Trainer id
        id: String,
    },

    /// Stream trainers whose name contains a fragment
    List {
        /// Name fragment (case-insensitive)
        name: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), RosterError> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get { id } => print_trainer(&client.get(&id)?),
        Commands::Create {
            names,
            age,
            birth_date,
            medals,
        } => {
            let inputs = names.into_iter().map(|name| NewTrainer {
                name,
                age,
                birth_date,
                medals: Some(medals.clone()),
            });
            let summary = client.create(inputs)?;
            println!("created {}", summary.success_count);
            for trainer in &summary.trainers {
                print_trainer(trainer);
            }
        }
        Commands::Update {
            id,
            name,
            age,
            birth_date,
            medals,
        } => {
            let update = UpdateTrainer {
                id,
                name,
                age,
                birth_date,
                medals: Some(medals),
            };
            print_trainer(&client.update(&update)?);
        }
        Commands::Delete { id } => {
            let removed = client.delete(&id)?;
            println!("deleted {}", removed.id);
        }
        Commands::List { name } => {
            for trainer in client.list_by_name(&name)? {
                print_trainer(&trainer);
            }
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}

fn parse_medal(raw: &str) -> Result<Medal, String> {
    let (region, tier) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected region:tier, got '{}'", raw))?;
    let tier = tier.parse().map_err(|e: RosterError| e.to_string())?;
    Ok(Medal::new(region, tier))
}

fn print_trainer(trainer: &Trainer) {
    let medals: Vec<String> = trainer
        .medals
        .iter()
        .map(|m| format!("{}:{}", m.region, m.tier))
        .collect();
    println!(
        "{}  {}  age={}  born={}  created={}  medals=[{}]",
        trainer.id,
        trainer.name,
        trainer.age,
        trainer.birth_date.to_rfc3339(),
        trainer.created_at.to_rfc3339(),
        medals.join(", ")
    );
}
