//! mpdwire CLI Client
//!
//! Runs one command against a server and prints the decoded reply.

use clap::Parser;
use mpdwire::{ClientConfig, Client, Command, FieldValue, Object, Response};
use tracing_subscriber::{fmt, EnvFilter};

/// mpdwire CLI
#[derive(Parser, Debug)]
#[command(name = "mpdwire-cli")]
#[command(about = "Send one command to a music player daemon")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6600")]
    server: String,

    /// Password to authenticate with
    #[arg(short, long)]
    password: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Command name (e.g. status, lsinfo, find)
    command: String,

    /// Command arguments
    args: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mpdwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = ClientConfig::builder()
        .server_addr(&args.server)
        .connect_timeout_ms(args.timeout_ms);
    if let Some(password) = &args.password {
        builder = builder.password(password);
    }

    let client = match Client::connect(builder.build()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    if let Some(version) = client.version() {
        tracing::info!("Connected to {} (protocol {})", args.server, version);
    }

    let command = Command::new(&args.command).args(&args.args);
    match client.call(&command) {
        Ok(response) => print_response(response),
        Err(e) => {
            tracing::error!("{} failed: {}", args.command, e);
            client.close();
            std::process::exit(1);
        }
    }

    client.close();
}

fn print_response(response: Response) {
    match response {
        Response::Nothing => println!("OK"),
        Response::Item(Some(value)) => println!("{}", value),
        Response::Item(None) => {}
        Response::List(values) => values.iter().for_each(|v| println!("{}", v)),
        Response::Object(object) => print_object(&object),
        Response::Objects(objects) => {
            for (i, object) in objects.enumerate() {
                if i > 0 {
                    println!();
                }
                print_object(&object);
            }
        }
    }
}

fn print_object(object: &Object) {
    for (key, value) in object {
        match value {
            FieldValue::Single(v) => println!("{}: {}", key, v),
            FieldValue::Multiple(values) => values.iter().for_each(|v| println!("{}: {}", key, v)),
        }
    }
}
