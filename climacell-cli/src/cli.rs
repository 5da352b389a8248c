use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use climacell_core::{ApiClient, Settings, StoredSettings};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climacell", version, about = "Checking the weather in style")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Which place a forecast is for: a location name or explicit coordinates.
/// When both are given, the coordinates win.
#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Location name, e.g. "Berlin"; resolved through the geocoder.
    pub location: Option<String>,

    /// Latitude in degrees, used together with --lon instead of a name.
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,
}

impl PlaceArgs {
    fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    fn label(&self) -> String {
        match (&self.location, self.coords()) {
            (Some(name), _) => name.clone(),
            (None, Some((lat, lon))) => format!("{lat}, {lon}"),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Comma-separated fields to request instead of the configured defaults.
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

impl FieldArgs {
    fn as_deref(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Start of the window, RFC 3339 or "now".
    #[arg(long)]
    pub start: Option<String>,

    /// End of the window, RFC 3339 or "now".
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API credentials in the config file.
    Configure,

    /// Real-time observational data.
    Realtime {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Minute-by-minute forecast for the next six hours.
    Nowcast {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
        #[command(flatten)]
        window: WindowArgs,

        /// Minutes between data points (default 5).
        #[arg(long)]
        timestep: Option<u32>,
    },

    /// Hourly forecast, up to 108 hours out.
    Hourly {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Daily forecast with summaries, up to 15 days out.
    Daily {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
        #[command(flatten)]
        window: WindowArgs,

        /// Print the raw JSON payload instead of the summary.
        #[arg(long)]
        json: bool,
    },

    /// Historical data for the last six hours by default.
    History {
        #[command(subcommand)]
        source: HistorySource,
    },

    /// Fire danger index.
    FireIndex {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistorySource {
    /// ClimaCell's own historical layer.
    Climacell {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
        #[command(flatten)]
        window: WindowArgs,

        /// Minutes between data points (default 5).
        #[arg(long)]
        timestep: Option<u32>,
    },

    /// Weather station observations.
    Station {
        #[command(flatten)]
        place: PlaceArgs,
        #[command(flatten)]
        fields: FieldArgs,
        #[command(flatten)]
        window: WindowArgs,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Realtime { place, fields } => {
                let client = client_for(&place).await?;
                print_json(&client.realtime(fields.as_deref()).await?)
            }
            Command::Nowcast { place, fields, window, timestep } => {
                let client = client_for(&place).await?;
                let payload = client
                    .nowcast(
                        timestep,
                        window.start.as_deref(),
                        window.end.as_deref(),
                        fields.as_deref(),
                    )
                    .await?;
                print_json(&payload)
            }
            Command::Hourly { place, fields, window } => {
                let client = client_for(&place).await?;
                let payload = client
                    .hourly(window.start.as_deref(), window.end.as_deref(), fields.as_deref())
                    .await?;
                print_json(&payload)
            }
            Command::Daily { place, fields, window, json } => {
                let client = client_for(&place).await?;
                let payload = client
                    .daily(window.start.as_deref(), window.end.as_deref(), fields.as_deref())
                    .await?;
                if json {
                    print_json(&payload)
                } else {
                    print_daily(&place.label(), &payload);
                    Ok(())
                }
            }
            Command::History { source } => match source {
                HistorySource::Climacell { place, fields, window, timestep } => {
                    let client = client_for(&place).await?;
                    let payload = client
                        .climacell(
                            timestep,
                            window.start.as_deref(),
                            window.end.as_deref(),
                            fields.as_deref(),
                        )
                        .await?;
                    print_json(&payload)
                }
                HistorySource::Station { place, fields, window } => {
                    let client = client_for(&place).await?;
                    let payload = client
                        .station(window.start.as_deref(), window.end.as_deref(), fields.as_deref())
                        .await?;
                    print_json(&payload)
                }
            },
            Command::FireIndex { place, fields } => {
                let client = client_for(&place).await?;
                print_json(&client.fire_index(fields.as_deref()).await?)
            }
        }
    }
}

async fn client_for(place: &PlaceArgs) -> Result<ApiClient> {
    let settings = Settings::load()?;
    Ok(ApiClient::new(&settings, place.coords(), place.location.as_deref()).await?)
}

fn print_json(payload: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

/// Per-day min -> max temperature summary.
fn print_daily(label: &str, payload: &Value) {
    println!("Daily forecast: {label}");

    let Some(days) = payload.as_array() else {
        println!("{payload}");
        return;
    };

    for day in days {
        match day_line(day) {
            Some(line) => println!("{line}"),
            None => println!("{day}"),
        }
    }
}

fn day_line(day: &Value) -> Option<String> {
    let temp = day.get("temp")?.as_array()?;
    let min = temp.first()?.get("min")?.get("value")?;
    let max = temp.get(1)?.get("max")?.get("value")?;
    Some(format!("🌡 {min}C -> {max}C"))
}

/// Interactive credential setup; new values replace the stored ones.
fn configure() -> Result<()> {
    let mut stored = StoredSettings::load()?;

    let api_key = inquire::Text::new("ClimaCell API key:")
        .with_initial_value(stored.api_key.as_deref().unwrap_or(""))
        .prompt()?;
    let geocoder_key = inquire::Text::new("OpenCage geocoder key (optional):")
        .with_initial_value(stored.geocoder_key.as_deref().unwrap_or(""))
        .prompt()?;

    stored.api_key = Some(api_key).filter(|key| !key.is_empty());
    stored.geocoder_key = Some(geocoder_key).filter(|key| !key.is_empty());
    stored.save()?;

    println!("Saved {}", StoredSettings::config_file_path()?.display());
    Ok(())
}
