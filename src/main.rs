//! location2alert cli - Location novelty alerts from the usual areas of a user

use std::fs::{self, File};

use argopt::{cmd_group, subcmd};
use bson::Document;
use csv::ReaderBuilder;
use mongodb::sync::Client;
use serde::Deserialize;
use time::format_description::well_known;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use location2alert::sources::{CsvSource, MongoDbSource};
use location2alert::{FieldsConfiguration, GeofenceEvaluator, GeofenceOptions, HistorySource};

/// CLI of location2alert - Tell whether a location is outside the usual areas of a user
#[cmd_group(commands = [csv, mongo, regions_csv, regions_mongo])]
fn main() -> Result<(), String> {}

/// Evaluate a location against a CSV file history. Prints `true` when the location is novel
#[subcmd]
fn csv(
    /// CSV file source
    csv_path: String,
    /// User id
    user_id: String,
    /// Location to evaluate, as `lng,lat`
    #[opt(allow_hyphen_values = true)]
    location: String,
    /// Clustering radius in meters. Default: from the config, 260
    #[opt(long)]
    radius: Option<f64>,
    /// Only consider the history since this time, RFC3339 format
    #[opt(long)]
    since: Option<String>,
    /// Fields and geofence configuration. Default: .loc2alert.yaml, ~/.loc2alert.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    let (fields, options) = setup(config);
    let (lng, lat) = parse_location(&location)?;

    let source = open_csv(&csv_path, fields, since)?;

    evaluate(source, options, &user_id, lng, lat, radius)
}

/// Evaluate a location against a mongodb collection history. Prints `true` when the location is novel
#[subcmd]
fn mongo(
    /// Mongo connection string source
    connection: String,
    /// Mongo collection name
    collection: String,
    /// User id
    user_id: String,
    /// Location to evaluate, as `lng,lat`
    #[opt(allow_hyphen_values = true)]
    location: String,
    /// Clustering radius in meters. Default: from the config, 260
    #[opt(long)]
    radius: Option<f64>,
    /// Only consider the history since this time, RFC3339 format
    #[opt(long)]
    since: Option<String>,
    /// Fields and geofence configuration. Default: .loc2alert.yaml, ~/.loc2alert.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    let (fields, options) = setup(config);
    let (lng, lat) = parse_location(&location)?;

    let source = open_mongo(&connection, &collection, fields, since)?;

    evaluate(source, options, &user_id, lng, lat, radius)
}

/// Print the regions built from a CSV file history, as YAML
#[subcmd]
fn regions_csv(
    /// CSV file source
    csv_path: String,
    /// User id
    user_id: String,
    /// Clustering radius in meters. Default: from the config, 260
    #[opt(long)]
    radius: Option<f64>,
    /// Only consider the history since this time, RFC3339 format
    #[opt(long)]
    since: Option<String>,
    /// Fields and geofence configuration. Default: .loc2alert.yaml, ~/.loc2alert.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    let (fields, options) = setup(config);

    let source = open_csv(&csv_path, fields, since)?;

    print_regions(source, options, &user_id, radius)
}

/// Print the regions built from a mongodb collection history, as YAML
#[subcmd]
fn regions_mongo(
    /// Mongo connection string source
    connection: String,
    /// Mongo collection name
    collection: String,
    /// User id
    user_id: String,
    /// Clustering radius in meters. Default: from the config, 260
    #[opt(long)]
    radius: Option<f64>,
    /// Only consider the history since this time, RFC3339 format
    #[opt(long)]
    since: Option<String>,
    /// Fields and geofence configuration. Default: .loc2alert.yaml, ~/.loc2alert.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    let (fields, options) = setup(config);

    let source = open_mongo(&connection, &collection, fields, since)?;

    print_regions(source, options, &user_id, radius)
}

fn evaluate<S: HistorySource>(
    source: S,
    options: GeofenceOptions,
    user_id: &str,
    lng: f64,
    lat: f64,
    radius: Option<f64>,
) -> Result<(), String> {
    let evaluator = GeofenceEvaluator::with_options(source, options);

    let alert = evaluator
        .evaluate(user_id, lng, lat, radius)
        .map_err(|e| e.to_string())?;

    println!("{}", alert);

    Ok(())
}

fn print_regions<S: HistorySource>(
    source: S,
    options: GeofenceOptions,
    user_id: &str,
    radius: Option<f64>,
) -> Result<(), String> {
    let evaluator = GeofenceEvaluator::with_options(source, options);

    let geofence = evaluator
        .geofence(user_id, radius)
        .map_err(|e| e.to_string())?;
    let yaml = serde_yaml::to_string(&geofence)
        .map_err(|e| format!("Failed on serialize the regions: {}", e))?;

    print!("{}", yaml);

    Ok(())
}

fn open_csv(
    path: &str,
    fields: FieldsConfiguration,
    since: Option<String>,
) -> Result<CsvSource, String> {
    let file = File::open(path).map_err(|e| format!("Failed on open the CSV file: {}", e))?;
    let rdr = ReaderBuilder::new().flexible(true).from_reader(file);

    let mut source = CsvSource::new(rdr, Some(fields)).map_err(|e| e.to_string())?;
    if let Some(since) = parse_since(since)? {
        source = source.since(since);
    }

    Ok(source)
}

fn open_mongo(
    connection: &str,
    collection: &str,
    fields: FieldsConfiguration,
    since: Option<String>,
) -> Result<MongoDbSource, String> {
    let client =
        Client::with_uri_str(connection).map_err(|e| format!("Failed on connect: {0}", e))?;
    let db = client
        .default_database()
        .ok_or("Default database not provided")?;
    let collection = db.collection::<Document>(collection);

    let mut source = MongoDbSource::new(collection, Some(fields));
    if let Some(since) = parse_since(since)? {
        source = source.since(since);
    }

    Ok(source)
}

fn parse_since(since: Option<String>) -> Result<Option<OffsetDateTime>, String> {
    since
        .map(|s| {
            OffsetDateTime::parse(&s, &well_known::Rfc3339)
                .map_err(|e| format!("Failed on parse the since time: {}", e))
        })
        .transpose()
}

/// Parse a `lng,lat` pair
fn parse_location(raw: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = raw.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return Err(format!("Invalid location `{}`, expected `lng,lat`", raw));
    }

    let lng = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Invalid longitude format: {}", e))?;
    let lat = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Invalid latitude format: {}", e))?;

    Ok((lng, lat))
}

/// Load the config and start the logging
fn setup(provided: Option<String>) -> (FieldsConfiguration, GeofenceOptions) {
    let conf = load_configs(provided);

    let filter = EnvFilter::try_new(&conf.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    (conf.fields, conf.geofence)
}

/// Load the current config
fn load_configs(provided: Option<String>) -> Configs {
    let mut options = vec![];

    if let Some(sprovided) = provided {
        options.push(sprovided);
    }

    options.push(".loc2alert.yaml".to_string());

    if let Some(home) = dirs::home_dir() {
        if let Some(shome) = home.to_str() {
            options.push(format!("{}/.loc2alert.yaml", shome));
        }
    }

    let yaml = options.iter().find_map(|fi| fs::read_to_string(fi).ok());

    yaml.and_then(|s| serde_yaml::from_str::<Configs>(&s).ok())
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
struct Configs {
    pub fields: FieldsConfiguration,
    pub geofence: GeofenceOptions,
    pub log_level: String,
}

impl Default for Configs {
    fn default() -> Self {
        Self {
            fields: FieldsConfiguration::default(),
            geofence: GeofenceOptions::default(),
            log_level: "info".to_string(),
        }
    }
}

#[test]
fn parse_configs() -> Result<(), String> {
    let yaml = "log_level: debug";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    assert_eq!(
        Configs {
            fields: FieldsConfiguration {
                user_id: "user".to_string(),
                coordinates: "coordinates".to_string(),
                time: "time".to_string(),
                flip_coordinates: false,
            },
            geofence: GeofenceOptions {
                radius_meters: 260.0,
                min_samples: 3,
                reference_latitude: 40.0,
            },
            log_level: "debug".to_string(),
        },
        conf
    );

    let yaml = "\nfields:\n  user_id: dev_id\ngeofence:\n  radius_meters: 500";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    assert_eq!("dev_id", conf.fields.user_id);
    assert_eq!("coordinates", conf.fields.coordinates);
    assert_eq!(500.0, conf.geofence.radius_meters);
    assert_eq!(3, conf.geofence.min_samples);
    assert_eq!("info", conf.log_level);

    Ok(())
}

#[test]
fn parse_locations() -> Result<(), String> {
    assert_eq!((-48.8702222, -26.31832), parse_location("-48.8702222,-26.31832")?);
    assert_eq!((10.0, 10.0), parse_location(" 10 , 10 ")?);
    assert!(parse_location("10").is_err());
    assert!(parse_location("a,10").is_err());

    Ok(())
}
