//! `rentctl` - CLI for carrental
//!
//! This binary provides the command-line interface for registering cars and
//! clients and for opening and billing rentals.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use carrental::cli::{
    CarCommand, Cli, ClientCommand, Command, ConfigCommand, OutputFormat, RentalCommand,
};
use carrental::{
    init_logging, Car, CarRegistry, Client, ClientRegistry, Config, Database, NewCar, NewClient,
    Rental, RentalManager,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Init => handle_init(&config),
        Command::Car(cmd) => handle_car(&open_database(&config)?, cmd),
        Command::Client(cmd) => handle_client(&open_database(&config)?, cmd),
        Command::Rental(cmd) => handle_rental(&config, &open_database(&config)?, cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.database_path();
    Database::open_with_timeout(&path, config.busy_timeout())
        .with_context(|| format!("failed to open database at {}", path.display()))
}

fn handle_init(config: &Config) -> anyhow::Result<()> {
    let db = open_database(config)?;
    println!("Car rental backend initialized.");
    println!("Database: {}", db.path().display());
    Ok(())
}

fn handle_car(db: &Database, cmd: CarCommand) -> anyhow::Result<()> {
    let registry = CarRegistry::new(db.clone());
    match cmd {
        CarCommand::Add {
            model,
            hourly_rate,
            per_km_rate,
            output,
        } => {
            let car = registry.add_car(NewCar::new(model, hourly_rate, per_km_rate))?;
            emit(output.format, &car, print_car)?;
        }
        CarCommand::List(output) => {
            let cars = registry.get_all_cars()?;
            emit_list(output.format, &cars, "No cars registered.", print_car)?;
        }
        CarCommand::Show { id, output } => {
            let car = registry
                .get_car(id)?
                .with_context(|| format!("car {id} not found"))?;
            emit(output.format, &car, print_car)?;
        }
    }
    Ok(())
}

fn handle_client(db: &Database, cmd: ClientCommand) -> anyhow::Result<()> {
    let registry = ClientRegistry::new(db.clone());
    match cmd {
        ClientCommand::Register {
            name,
            email,
            output,
        } => {
            let client = registry.register_client(NewClient::new(name, email))?;
            emit(output.format, &client, print_client)?;
        }
        ClientCommand::List(output) => {
            let clients = registry.get_all_clients()?;
            emit_list(output.format, &clients, "No clients registered.", print_client)?;
        }
        ClientCommand::Show { id, output } => {
            let client = registry
                .get_client(id)?
                .with_context(|| format!("client {id} not found"))?;
            emit(output.format, &client, print_client)?;
        }
    }
    Ok(())
}

fn handle_rental(config: &Config, db: &Database, cmd: RentalCommand) -> anyhow::Result<()> {
    let rentals = RentalManager::with_system_clock(db.clone(), config.billing_policy());
    match cmd {
        RentalCommand::Start {
            client,
            car,
            output,
        } => {
            let rental = rentals.start_rental(client, car)?;
            emit(output.format, &rental, print_rental)?;
        }
        RentalCommand::End { id, km, output } => {
            let rental = rentals.end_rental(id, km)?;
            emit(output.format, &rental, print_rental)?;
        }
        RentalCommand::Show { id, output } => {
            let rental = rentals
                .get_rental(id)?
                .with_context(|| format!("rental {id} not found"))?;
            emit(output.format, &rental, print_rental)?;
        }
        RentalCommand::List { status, output } => {
            let list = rentals.list_rentals(status.map(Into::into))?;
            emit_list(output.format, &list, "No rentals found.", print_rental)?;
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let stats = db.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": db.path(),
            "amount_scale": config.billing.amount_scale,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("rentctl status");
        println!("--------------");
        println!("Database:        {}", db.path().display());
        println!("Size:            {} bytes", stats.db_size_bytes);
        println!("Cars:            {}", stats.cars);
        println!("Clients:         {}", stats.clients);
        println!("Open rentals:    {}", stats.open_rentals);
        println!("Closed rentals:  {}", stats.closed_rentals);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Billing]");
                println!("  Amount scale:       {}", config.billing.amount_scale);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn emit<T: Serialize>(format: OutputFormat, item: &T, print: fn(&T)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        OutputFormat::Plain => print(item),
    }
    Ok(())
}

fn emit_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    empty: &str,
    print: fn(&T),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Plain if items.is_empty() => println!("{empty}"),
        OutputFormat::Plain => items.iter().for_each(print),
    }
    Ok(())
}

fn print_car(car: &Car) {
    println!(
        "#{:<5} {:<24} {:>10}/h {:>8}/km",
        car.id, car.model, car.hourly_rate, car.per_km_rate
    );
}

fn print_client(client: &Client) {
    println!("#{:<5} {:<24} {}", client.id, client.name, client.email);
}

fn print_rental(rental: &Rental) {
    let started = rental.start_time.format("%Y-%m-%d %H:%M:%S");
    match (rental.end_time, rental.kilometers_driven, rental.total_amount) {
        (Some(end), Some(km), Some(total)) => println!(
            "#{:<5} client {:<5} car {:<5} {} -> {}  {} km  total {}",
            rental.id,
            rental.client_id,
            rental.car_id,
            started,
            end.format("%Y-%m-%d %H:%M:%S"),
            km,
            total
        ),
        _ => println!(
            "#{:<5} client {:<5} car {:<5} {} -> (open)",
            rental.id, rental.client_id, rental.car_id, started
        ),
    }
}
