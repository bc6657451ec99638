//! Layout table overrides read from TOML.
//!
//! ```toml
//! [[desktop]]
//! id = 1
//! x = 9
//! y = 13
//! rotation = -8
//! width = 240
//! height = 180
//!
//! [[mobile]]
//! id = 2
//! # ...
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use super::table::{LayoutTable, LayoutTables, Position};
use crate::gallery::LayoutError;
use crate::models::{Catalog, PhotoId};

#[derive(Debug, Deserialize)]
struct LayoutFile {
    #[serde(default)]
    desktop: Vec<LayoutEntry>,
    #[serde(default)]
    mobile: Vec<LayoutEntry>,
}

#[derive(Debug, Deserialize)]
struct LayoutEntry {
    id: u32,
    x: i32,
    y: i32,
    #[serde(default)]
    rotation: i32,
    width: u32,
    height: u32,
}

fn build_table(entries: Vec<LayoutEntry>) -> Result<LayoutTable, LayoutError> {
    let mut table = LayoutTable::new();
    for entry in entries {
        let position = Position::new(entry.x, entry.y, entry.rotation, entry.width, entry.height);
        if table.insert(PhotoId(entry.id), position).is_some() {
            return Err(LayoutError::DuplicateId(PhotoId(entry.id)));
        }
    }
    Ok(table)
}

/// Parses a layout file body.
pub fn parse(content: &str) -> Result<LayoutTables> {
    let file: LayoutFile = toml::from_str(content).context("Invalid layout file")?;
    let desktop = build_table(file.desktop).context("Invalid desktop table")?;
    let mobile = build_table(file.mobile).context("Invalid mobile table")?;
    Ok(LayoutTables::new(desktop, mobile))
}

pub fn load_from_path(path: &Path) -> Result<LayoutTables> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file: {:?}", path))?;
    parse(&content).with_context(|| format!("Failed to parse layout file: {:?}", path))
}

/// Tables to use for `catalog`. Without an override file these are the
/// built-in tables. An override that exists must load and cover the catalog.
pub fn resolve(path: Option<&Path>, catalog: &Catalog) -> Result<LayoutTables> {
    let Some(path) = path.filter(|path| path.exists()) else {
        debug!("No layout override, using built-in tables");
        return Ok(LayoutTables::default());
    };

    let tables = load_from_path(path)?;
    tables
        .validate(catalog)
        .with_context(|| format!("Layout file {:?} does not cover the photo catalog", path))?;
    info!(
        "Loaded layout override from {:?} ({} desktop, {} mobile)",
        path,
        tables.desktop.len(),
        tables.mobile.len()
    );
    Ok(tables)
}
