use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Args;
use informe_core::config::{FetchConfig, GeneratorConfig, API_KEY_ENV, DEFAULT_MODEL};
use informe_core::display::PrepareOptions;
use informe_core::filter::{ColumnFilter, FilterSet};
use informe_core::prompt::AnalysisLevel;
use rust_decimal::Decimal;

/// Where the data comes from.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Input file: .xls, .xlsx, .csv, .docx or .pdf
    pub input_file: Option<PathBuf>,

    /// Web page to read when no input file is given
    #[arg(long)]
    pub url: Option<String>,

    /// MIME type of the input file (takes precedence over the extension)
    #[arg(long)]
    pub mime: Option<String>,

    /// Timeout for fetching --url, in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,
}

impl SourceArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: self.fetch_timeout.map(Duration::from_secs),
            ..FetchConfig::default()
        }
    }
}

/// Column selection, filters and quartile segmentation.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Keep only these columns (repeatable, in order)
    #[arg(short = 'c', long = "column", value_name = "NAME")]
    pub columns: Vec<String>,

    /// Keep rows whose numeric column lies in [LO, HI]
    #[arg(long = "range", value_name = "COL=LO..HI", value_parser = parse_range)]
    pub ranges: Vec<(String, Decimal, Decimal)>,

    /// Keep rows whose text column equals VALUE (repeat to allow several values)
    #[arg(long = "include", value_name = "COL=VALUE", value_parser = parse_include)]
    pub includes: Vec<(String, String)>,

    /// Keep rows whose date column lies in [START, END] (YYYY-MM-DD)
    #[arg(long = "dates", value_name = "COL=START..END", value_parser = parse_dates)]
    pub dates: Vec<(String, NaiveDate, NaiveDate)>,

    /// Append a quartile column computed from this numeric column
    #[arg(short = 'q', long, value_name = "COL")]
    pub quartile: Option<String>,
}

impl PrepareArgs {
    pub fn to_options(&self) -> PrepareOptions {
        let mut filters = FilterSet::new();
        for (column, lo, hi) in &self.ranges {
            filters.push(column, ColumnFilter::NumericRange { lo: *lo, hi: *hi });
        }
        let mut categories: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (column, value) in &self.includes {
            categories.entry(column).or_default().push(value.clone());
        }
        for (column, values) in categories {
            filters.push(column, ColumnFilter::Categories(values.into_iter().collect()));
        }
        for (column, start, end) in &self.dates {
            filters.push(column, ColumnFilter::DateRange { start: *start, end: *end });
        }
        PrepareOptions {
            columns: self.columns.clone(),
            filters,
            quartile_column: self.quartile.clone(),
        }
    }
}

/// Prompt settings shared by `prompt` and `report`.
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Analysis level: site-lead, manager, director or general
    #[arg(short, long, default_value = "general", value_parser = parse_level)]
    pub level: AnalysisLevel,

    /// Extra context for the report
    #[arg(long)]
    pub context: Option<String>,
}

/// Report service settings.
#[derive(Args, Debug)]
pub struct GeneratorArgs {
    /// API key for the report service
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: String,

    /// Model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Timeout for the report request, in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl GeneratorArgs {
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.api_key.clone())
            .with_model(self.model.clone())
            .with_timeout(self.timeout.map(Duration::from_secs))
    }
}

fn split_assignment(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((column, rest)) if !column.trim().is_empty() => Ok((column.trim(), rest.trim())),
        _ => Err(format!("expected COL=..., got '{s}'")),
    }
}

fn split_interval<T: FromStr>(s: &str) -> Result<(T, T), String>
where
    T::Err: std::fmt::Display,
{
    let (lo, hi) = s
        .split_once("..")
        .ok_or_else(|| format!("expected LO..HI, got '{s}'"))?;
    let lo = lo.trim().parse::<T>().map_err(|e| format!("'{}': {e}", lo.trim()))?;
    let hi = hi.trim().parse::<T>().map_err(|e| format!("'{}': {e}", hi.trim()))?;
    Ok((lo, hi))
}

fn parse_range(s: &str) -> Result<(String, Decimal, Decimal), String> {
    let (column, interval) = split_assignment(s)?;
    let (lo, hi) = split_interval::<Decimal>(interval)?;
    Ok((column.to_string(), lo, hi))
}

fn parse_include(s: &str) -> Result<(String, String), String> {
    let (column, value) = split_assignment(s)?;
    Ok((column.to_string(), value.to_string()))
}

fn parse_dates(s: &str) -> Result<(String, NaiveDate, NaiveDate), String> {
    let (column, interval) = split_assignment(s)?;
    let (start, end) = split_interval::<NaiveDate>(interval)?;
    Ok((column.to_string(), start, end))
}

fn parse_level(s: &str) -> Result<AnalysisLevel, String> {
    s.parse::<AnalysisLevel>().map_err(|e| e.to_string())
}
