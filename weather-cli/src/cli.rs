use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use weather_core::{
    AggregationRequest, Config, DocumentStore, ExportFormat, HistoryFilter, ManualRecord,
    ProviderId, Providers, RecordPatch, RecordService, UserId, WeatherService, locate,
    model::parse_record_id, provider::geocoder_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "openweather", "openmeteo" or "opencage".
        provider: String,
    },

    /// Fetch current, past and upcoming weather for a coordinate and store it.
    Fetch {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Owner of the stored record.
        #[arg(long)]
        user: String,

        /// Language for weather descriptions; defaults to the configured one.
        #[arg(long)]
        lang: Option<String>,
    },

    /// Show stored records, newest first.
    History {
        #[arg(long)]
        user: Option<String>,

        /// Local calendar day, YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,

        /// Case-insensitive part of the location name.
        #[arg(long)]
        location: Option<String>,
    },

    /// Store a record by hand.
    Add {
        #[arg(long)]
        location: String,

        #[arg(long, allow_negative_numbers = true)]
        temperature: f64,

        #[arg(long)]
        weather: String,

        #[arg(long)]
        user: String,

        #[arg(long)]
        wind_speed: Option<f64>,

        #[arg(long)]
        humidity: Option<f64>,
    },

    /// Edit the location or current conditions of a stored record.
    Update {
        id: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,

        #[arg(long)]
        weather: Option<String>,

        #[arg(long)]
        wind_speed: Option<f64>,

        #[arg(long)]
        humidity: Option<f64>,
    },

    /// Delete a stored record.
    Delete { id: String },

    /// Look up coordinates for a place name.
    Locate { place: String },

    /// Export every stored record.
    Export {
        /// "csv" or "json".
        #[arg(long, default_value = "csv")]
        format: String,

        /// Defaults to weather_data.csv / weather_data.json in the current directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_config() -> anyhow::Result<Config> {
    Ok(Config::load()?.with_env_overrides(|name| std::env::var(name).ok()))
}

fn open_store(config: &Config) -> anyhow::Result<Arc<DocumentStore>> {
    let path = config.store_path()?;
    let store = DocumentStore::open(&path)
        .with_context(|| format!("Failed to open record store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let key = inquire::Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()?;
        config.upsert_provider_api_key(id, key.trim().to_string());
    }

    let current_url = config.provider_base_url(id).unwrap_or_default().to_string();
    let base_url = inquire::Text::new("Base URL (leave empty for the public endpoint):")
        .with_default(&current_url)
        .prompt()?;
    if !base_url.trim().is_empty() {
        config.set_provider_base_url(id, base_url.trim().to_string());
    }

    config.save()?;
    println!("Saved {id} configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider)?,

            Command::Fetch { lat, lon, user, lang } => {
                let config = load_config()?;
                let service = WeatherService::new(Providers::from_config(&config)?, open_store(&config)?);

                let lang = lang.unwrap_or_else(|| config.lang().to_string());
                let request = AggregationRequest::new(lat, lon, &user).with_lang(lang);
                let stored = service.fetch_and_store(request).await?;

                println!("{}", serde_json::to_string_pretty(&stored)?);
            }

            Command::History { user, date, location } => {
                let config = load_config()?;
                let records = RecordService::new(open_store(&config)?);

                let filter = HistoryFilter::parse(user.as_deref(), date.as_deref(), location.as_deref())?;
                let history = records.history(&filter).await?;

                println!("{}", serde_json::to_string_pretty(&history)?);
            }

            Command::Add { location, temperature, weather, user, wind_speed, humidity } => {
                let config = load_config()?;
                let records = RecordService::new(open_store(&config)?);

                let stored = records
                    .create_manual(ManualRecord {
                        user: UserId::parse(&user),
                        location,
                        weather_description: weather,
                        temperature_c: temperature,
                        wind_speed_kmh: wind_speed,
                        humidity_pct: humidity,
                    })
                    .await?;

                println!("{}", serde_json::to_string_pretty(&stored)?);
            }

            Command::Update { id, location, temperature, weather, wind_speed, humidity } => {
                let config = load_config()?;
                let records = RecordService::new(open_store(&config)?);

                let patch = RecordPatch {
                    location,
                    weather_description: weather,
                    temperature_c: temperature,
                    humidity_pct: humidity,
                    wind_speed_kmh: wind_speed,
                };
                let updated = records.update(parse_record_id(&id)?, &patch).await?;

                println!("{}", serde_json::to_string_pretty(&updated)?);
            }

            Command::Delete { id } => {
                let config = load_config()?;
                let records = RecordService::new(open_store(&config)?);

                records.delete(parse_record_id(&id)?).await?;
                println!("Weather record deleted successfully.");
            }

            Command::Locate { place } => {
                let config = load_config()?;
                let geocoder = geocoder_from_config(&config)?;

                let coord = locate(geocoder.as_ref(), &place).await?;
                println!("{}", serde_json::to_string_pretty(&coord)?);
            }

            Command::Export { format, output } => {
                let config = load_config()?;
                let records = RecordService::new(open_store(&config)?);

                let format = ExportFormat::try_from(format.as_str())?;
                let bytes = records.export(format).await?;

                let path = output.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
                std::fs::write(&path, &bytes)
                    .with_context(|| format!("Failed to write export file: {}", path.display()))?;
                println!("Exported {} ({}) to {}", format, format.content_type(), path.display());
            }
        }

        Ok(())
    }
}
