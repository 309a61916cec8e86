use anyhow::{Context as _, Result};
use clap::Parser;
use pgdict::config::{AppConfig, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pgdict",
    version,
    about = "Generate a data dictionary from a PostgreSQL database reached over SSH",
    long_about = "Connection settings come from SSH_* and POSTGRES_* environment variables \
                  or an env file. Flags override the DICTIONARY_* settings."
)]
pub struct Cli {
    /// Env file to read settings from. Defaults to ./.env when present.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Output file path. Defaults to data_dictionary.<ext>.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output document format. Only the default file name follows it; a path
    /// given with --output or DICTIONARY_OUTPUT is used as is.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pdf)]
    pub format: OutputFormat,

    /// Schema to document; repeat for several. Overrides DICTIONARY_SCHEMAS.
    #[arg(short, long = "schema", value_name = "NAME")]
    pub schemas: Vec<String>,
}

impl Cli {
    /// Load the configuration and apply the flag overrides.
    pub fn into_config(self) -> Result<AppConfig> {
        let mut config =
            AppConfig::load(self.env_file.as_deref()).context("Failed to load configuration")?;
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(self, config: &mut AppConfig) -> Result<()> {
        config.format = self.format;
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        if !self.schemas.is_empty() {
            config.set_schemas(&self.schemas)?;
        }
        Ok(())
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    if let Some(path) = config.mismatched_output() {
        tracing::warn!(
            "Writing {:?} output to {}, whose extension does not match",
            config.format,
            path.display()
        );
    }
    tracing::info!(
        "Documenting schema(s) {} into {}",
        config.schemas.join(", "),
        config.output_path().display()
    );

    let report = pgdict::pipeline::generate(&config).await?;
    tracing::info!("{}", report.summary());
    Ok(())
}
