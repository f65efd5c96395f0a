//! Schema Registry CLI
//!
//! Inspect schema naming, content types and encoded headers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use message_schemas::config::{NamingConfig, NamingStrategyKind};
use message_schemas::{
    header_keys, Headers, MessageType, SchemaDataFormat, SchemaInfo, SchemaNameOutputFormat,
    SchemasConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Inspect message schema names, content types and headers")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema name generated for a message type
    Name {
        /// Declaring namespace of the message type
        #[arg(long)]
        namespace: String,
        /// Message type name
        #[arg(short, long)]
        message: String,
        /// Stream the message is appended to
        #[arg(short, long)]
        stream: Option<String>,
        /// Naming strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Output format: none, kebab-case, snake-case or urn
        #[arg(short, long)]
        format: Option<SchemaNameOutputFormat>,
        /// Namespace identifier for the namespace strategies
        #[arg(long)]
        namespace_id: Option<String>,
    },

    /// Print the content type of a data format
    ContentType {
        /// json, protobuf, avro, bytes or unspecified
        format: SchemaDataFormat,
    },

    /// Decode an encoded header payload
    Headers {
        /// File holding the encoded headers
        file: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    Message,
    Category,
    Namespace,
    NamespaceCategory,
}

impl From<StrategyArg> for NamingStrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Message => NamingStrategyKind::Message,
            StrategyArg::Category => NamingStrategyKind::Category,
            StrategyArg::Namespace => NamingStrategyKind::Namespace,
            StrategyArg::NamespaceCategory => NamingStrategyKind::NamespaceCategory,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = SchemasConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Name {
            namespace,
            message,
            stream,
            strategy,
            format,
            namespace_id,
        } => {
            let naming = NamingConfig {
                strategy: strategy.map(Into::into).unwrap_or(config.naming.strategy),
                namespace_id: namespace_id.or(config.naming.namespace_id),
                output_format: format.unwrap_or(config.naming.output_format),
            };
            // The process exits right after printing
            let message_type = MessageType::new(namespace.leak(), message.leak());
            let name = naming
                .strategy()?
                .generate_schema_name(&message_type, stream.as_deref())?;
            println!("{}", name);
        }

        Commands::ContentType { format } => {
            println!("{}", format.content_type());
        }

        Commands::Headers { file } => {
            let payload = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let headers = Headers::decode(&payload);
            print_headers(&headers);
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn print_headers(headers: &Headers) {
    let schema_info = SchemaInfo::from_headers(headers);
    println!("Schema");
    if schema_info.schema_name_missing() {
        println!("  name:    <missing>");
    } else {
        println!("  name:    {}", schema_info.schema_name);
    }
    println!("  format:  {}", schema_info.data_format);
    println!("  content: {}", schema_info.content_type());

    let system = headers.system_info().without_schema_info();
    if !system.is_empty() {
        println!("System");
        for (key, value) in system.iter() {
            println!("  {} = {}", key, value.unwrap_or("<null>"));
        }
    }

    let user = headers.without_system_info().without_schema_info();
    if !user.is_empty() {
        println!("User");
        for (key, value) in user.iter() {
            println!("  {} = {}", key, value.unwrap_or("<null>"));
        }
    }

    if headers.contains_key(header_keys::LEGACY_EVENT_METADATA) {
        println!("(legacy event metadata present)");
    }
}
