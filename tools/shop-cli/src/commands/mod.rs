//! CLI command implementations.

pub mod all;
pub mod drivers;
pub mod paginate;
pub mod search;

use anyhow::{bail, Result};
use clap::Args;
use serde_json::Value;
use shop_query::{Filters, SearchOptions};

/// Model selection and filters shared by every query command.
#[derive(Args)]
pub struct ModelArgs {
    /// Model name (e.g. Product).
    pub model: String,

    /// Filter as field=value. JSON values are parsed: 3, true, null, [1,2].
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,
}

impl ModelArgs {
    /// Parsed filters.
    pub fn filters(&self) -> Result<Filters> {
        self.filters
            .iter()
            .map(|pair| parse_pair(pair))
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().collect())
    }
}

/// Arguments for the paginate and simple-paginate commands.
#[derive(Args)]
pub struct PageArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Page number.
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Items per page.
    #[arg(long, default_value = "15")]
    pub per_page: u32,

    /// Sort field.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending.
    #[arg(long)]
    pub desc: bool,

    /// Free-text term applied within the page.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Extra search option as key=value.
    #[arg(short, long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

impl PageArgs {
    /// Search options built from the flags.
    pub fn options(&self) -> Result<SearchOptions> {
        build_options(
            &self.options,
            Some(self.page),
            self.sort.as_deref(),
            self.desc,
            self.search.as_deref(),
        )
    }
}

/// Arguments for the cursor-paginate command.
#[derive(Args)]
pub struct CursorArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Cursor from a previous page.
    #[arg(long)]
    pub cursor: Option<String>,

    /// Items per page.
    #[arg(long, default_value = "15")]
    pub per_page: u32,

    /// Free-text term applied within the page.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Extra search option as key=value.
    #[arg(short, long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

impl CursorArgs {
    /// Search options built from the flags.
    pub fn options(&self) -> Result<SearchOptions> {
        build_options(&self.options, None, None, false, self.search.as_deref())
    }
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Search text.
    pub query: String,

    /// Fields to search, comma separated. Defaults to the model's search fields.
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

/// Arguments for the all command.
#[derive(Args)]
pub struct AllArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Show only the first N records.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the drivers command.
#[derive(Args)]
pub struct DriversArgs {
    /// Only show routing for this model.
    #[arg(short, long)]
    pub model: Option<String>,
}

fn build_options(
    extra: &[String],
    page: Option<u32>,
    sort: Option<&str>,
    desc: bool,
    search: Option<&str>,
) -> Result<SearchOptions> {
    let mut options: SearchOptions = extra
        .iter()
        .map(|pair| parse_pair(pair))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .collect();

    if let Some(page) = page {
        options = options.with_page(page);
    }
    if let Some(field) = sort {
        let direction = if desc {
            shop_query::SortDirection::Desc
        } else {
            shop_query::SortDirection::Asc
        };
        options = options.with_sort(field, direction);
    }
    if let Some(term) = search {
        options = options.with(shop_query::request::SEARCH, term);
    }
    Ok(options)
}

/// Split `key=value`, reading the value as JSON when it parses and as a string otherwise.
pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", pair);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Missing key in '{}'", pair);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
