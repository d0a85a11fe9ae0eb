//! Process-wide memoised tables.
//!
//! Each table is read at most once per distinct [`SourceConfig`] and then
//! shared read-only. Entries are never invalidated; a changed source file is
//! picked up only after a restart.

use crate::config::SourceConfig;
use crate::data::{self, CensusTable, GeoTable};
use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

lazy_static! {
    static ref CENSUS: Mutex<HashMap<SourceConfig, Arc<CensusTable>>> = Mutex::new(HashMap::new());
    static ref GEO: Mutex<HashMap<SourceConfig, Arc<GeoTable>>> = Mutex::new(HashMap::new());
}

pub fn census(source: &SourceConfig) -> Result<Arc<CensusTable>> {
    cached(&CENSUS, source, data::load_census)
}

pub fn geo(source: &SourceConfig) -> Result<Arc<GeoTable>> {
    cached(&GEO, source, data::load_geo)
}

// The lock is held across the load so concurrent first requests read the
// file once.
fn cached<T>(
    cache: &Mutex<HashMap<SourceConfig, Arc<T>>>,
    source: &SourceConfig,
    load: fn(&SourceConfig) -> Result<T>,
) -> Result<Arc<T>> {
    let mut entries = cache.lock().map_err(|_| anyhow!("dataset cache lock poisoned"))?;
    if let Some(table) = entries.get(source) {
        debug!("cache hit for {:?}", source.path);
        return Ok(Arc::clone(table));
    }
    let table = Arc::new(load(source)?);
    entries.insert(source.clone(), Arc::clone(&table));
    Ok(table)
}
