use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tf_mock_provider::client::http::HttpResourceClient;
use tf_mock_provider::config::Config;
use tf_mock_provider::diagnostics::has_errors;
use tf_mock_provider::{AttrMap, AttrValue, Diagnostic, Instance, Registry, ResourceDefinition};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Schema-driven mock provider for AWS resources
#[derive(Parser, Debug)]
#[command(name = "tf-mock-provider", version, about, long_about = None)]
struct Args {
    /// Base URL of the mock backend
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Region sent with the provider configuration
    #[arg(long, global = true)]
    region: Option<String>,

    /// Provider schema dump to load instead of the bundled descriptors
    #[arg(long, global = true)]
    descriptors: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered resource types
    Resources {
        /// Only show types containing this substring
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Print the compiled schema of a resource type
    Schema {
        resource_type: String,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Send the provider configuration to the backend
    Configure {
        /// Persist backend URL and region to the config file on success
        #[arg(long)]
        save: bool,
    },
    /// Create a resource
    Create {
        resource_type: String,
        /// Attribute as name=value (value parsed as JSON when possible)
        #[arg(long = "attr", value_parser = parse_key_val)]
        attrs: Vec<(String, String)>,
    },
    /// Read a resource
    Read { resource_type: String, id: String },
    /// Update a resource
    Update {
        resource_type: String,
        id: String,
        #[arg(long = "attr", value_parser = parse_key_val)]
        attrs: Vec<(String, String)>,
    },
    /// Delete a resource
    Delete { resource_type: String, id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tf-mock-provider started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("tf-mock-provider")
            .join("tf-mock-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tf-mock-provider").join("tf-mock-provider.log");
    }
    PathBuf::from("tf-mock-provider.log")
}

/// Instance state and diagnostics after an operation
#[derive(Serialize)]
struct Outcome<'a> {
    resource_type: &'a str,
    id: Option<&'a str>,
    attributes: &'a AttrMap,
    diagnostics: &'a [Diagnostic],
}

/// Settings resolved from flags, the config file and the environment
struct Settings {
    config: Config,
    backend_url: String,
    region: Option<String>,
    descriptors: Option<PathBuf>,
}

impl Settings {
    fn resolve(args: &Args) -> Self {
        let config = Config::load();
        let backend_url = args
            .backend_url
            .clone()
            .unwrap_or_else(|| config.effective_backend_url());
        let region = args.region.clone().or_else(|| config.effective_region());
        let descriptors = args
            .descriptors
            .clone()
            .or_else(|| config.descriptor_path.clone());

        Self {
            config,
            backend_url,
            region,
            descriptors,
        }
    }

    fn registry(&self) -> Result<Registry> {
        let provider = self.config.effective_provider();
        Registry::load(self.descriptors.as_deref(), &provider)
            .context("Failed to load resource descriptors")
    }

    fn client(&self) -> Result<HttpResourceClient> {
        HttpResourceClient::with_timeout(&self.backend_url, self.config.request_timeout())
            .with_context(|| format!("Failed to create client for {}", self.backend_url))
    }
}

/// Case-insensitive substring match; no filter matches everything
fn matches_filter(name: &str, filter: Option<&str>) -> bool {
    filter.map_or(true, |f| name.to_lowercase().contains(&f.to_lowercase()))
}

fn lookup<'a>(registry: &'a Registry, resource_type: &str) -> Result<&'a ResourceDefinition> {
    registry
        .get(resource_type)
        .with_context(|| format!("Unknown resource type: {}", resource_type))
}

/// Build an instance from `--attr` pairs, conforming each value to its schema
fn build_instance(
    definition: &ResourceDefinition,
    id: Option<&str>,
    attrs: &[(String, String)],
) -> Result<Instance> {
    let mut instance = match id {
        Some(id) => Instance::with_id(id),
        None => Instance::new(),
    };

    for (name, raw) in attrs {
        let Some(schema) = definition.attributes().get(name) else {
            bail!(
                "{} has no attribute named {}",
                definition.resource_type,
                name
            );
        };
        let value = AttrValue::parse_literal(raw)
            .with_context(|| format!("Invalid value for {}", name))?;
        instance
            .set(name, value, schema)
            .with_context(|| format!("Invalid value for {}", name))?;
    }

    Ok(instance)
}

fn report(definition: &ResourceDefinition, instance: &Instance, diagnostics: &[Diagnostic]) -> Result<()> {
    let outcome = Outcome {
        resource_type: &definition.resource_type,
        id: instance.id(),
        attributes: instance.state(),
        diagnostics,
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
    if has_errors(diagnostics) {
        bail!("{} operation failed", definition.resource_type);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let settings = Settings::resolve(&args);
    tracing::info!("Using backend: {}", settings.backend_url);

    match &args.command {
        Command::Resources { filter } => {
            let registry = settings.registry()?;
            for name in registry.resource_types() {
                if matches_filter(name, filter.as_deref()) {
                    println!("{}", name);
                }
            }
        }
        Command::Schema {
            resource_type,
            format,
        } => {
            let registry = settings.registry()?;
            let definition = lookup(&registry, resource_type)?;
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(definition.attributes())?,
                OutputFormat::Yaml => serde_yaml::to_string(definition.attributes())?,
            };
            println!("{}", rendered);
        }
        Command::Configure { save } => {
            let Some(region) = settings.region.as_deref() else {
                bail!("No region configured. Set AWS_DEFAULT_REGION or use --region");
            };
            settings
                .client()?
                .configure(region)
                .await
                .context("Failed to configure backend")?;
            println!("Configured {} for region {}", settings.backend_url, region);

            if *save {
                let mut config = settings.config.clone();
                config.set_backend(&settings.backend_url, region)?;
            }
        }
        Command::Create {
            resource_type,
            attrs,
        } => {
            let registry = settings.registry()?;
            let definition = lookup(&registry, resource_type)?;
            let client = settings.client()?;
            let mut instance = build_instance(definition, None, attrs)?;
            let diagnostics = definition.create(&client, &mut instance).await;
            report(definition, &instance, &diagnostics)?;
        }
        Command::Read { resource_type, id } => {
            let registry = settings.registry()?;
            let definition = lookup(&registry, resource_type)?;
            let client = settings.client()?;
            let mut instance = Instance::with_id(id.as_str());
            let diagnostics = definition.read(&client, &mut instance).await;
            if instance.id().is_none() && diagnostics.is_empty() {
                eprintln!("{} {} does not exist", resource_type, id);
            }
            report(definition, &instance, &diagnostics)?;
        }
        Command::Update {
            resource_type,
            id,
            attrs,
        } => {
            let registry = settings.registry()?;
            let definition = lookup(&registry, resource_type)?;
            let client = settings.client()?;
            let mut instance = build_instance(definition, Some(id.as_str()), attrs)?;
            let diagnostics = definition.update(&client, &mut instance).await;
            report(definition, &instance, &diagnostics)?;
        }
        Command::Delete { resource_type, id } => {
            let registry = settings.registry()?;
            let definition = lookup(&registry, resource_type)?;
            let client = settings.client()?;
            let mut instance = Instance::with_id(id.as_str());
            let diagnostics = definition.delete(&client, &mut instance).await;
            report(definition, &instance, &diagnostics)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("bucket=my-bucket"),
            Ok(("bucket".to_string(), "my-bucket".to_string()))
        );
        assert_eq!(
            parse_key_val("policy={\"a\":\"b=c\"}"),
            Ok(("policy".to_string(), "{\"a\":\"b=c\"}".to_string()))
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_resource_filter_ignores_case() {
        assert!(matches_filter("aws_sqs_queue", None));
        assert!(matches_filter("aws_sqs_queue", Some("SQS")));
        assert!(matches_filter("AWS_SQS_QUEUE", Some("sqs")));
        assert!(!matches_filter("aws_sqs_queue", Some("sns")));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "tf-mock-provider",
            "--backend-url",
            "http://mock:4000",
            "create",
            "aws_sqs_queue",
            "--attr",
            "name=jobs",
            "--attr",
            "delay_seconds=5",
        ])
        .unwrap();

        assert_eq!(args.backend_url.as_deref(), Some("http://mock:4000"));
        match args.command {
            Command::Create {
                resource_type,
                attrs,
            } => {
                assert_eq!(resource_type, "aws_sqs_queue");
                assert_eq!(attrs.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_instance_conforms_values() {
        let registry = Registry::load(None, tf_mock_provider::resource::DEFAULT_PROVIDER).unwrap();
        let queue = lookup(&registry, "aws_sqs_queue").unwrap();

        let instance = build_instance(
            queue,
            None,
            &[
                ("name".into(), "jobs".into()),
                ("delay_seconds".into(), "5".into()),
            ],
        )
        .unwrap();
        assert_eq!(instance.get("delay_seconds"), Some(&AttrValue::Int(5)));

        assert!(build_instance(queue, None, &[("nope".into(), "x".into())]).is_err());
        assert!(build_instance(queue, None, &[("tags".into(), "x".into())]).is_err());
    }
}
