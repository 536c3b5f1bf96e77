//! Data Loading
//!
//! Loads the plant, organism and fungi tables with Polars and turns the rows
//! for one guild into typed `PlantRecord`s. This is the only place that sees
//! raw columns: list-vs-pipe-string typing, null cells and absent columns are
//! all resolved here, so the metrics only ever see `Option<BTreeSet<String>>`.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::DataPaths;
use crate::error::GuildError;
use crate::guild::{nitrogen_fixer_from_label, CsrScores, GrowthForm, Guild, Interaction, PlantRecord, CLIMATE_TIERS};
use crate::lookups::LookupTables;
use crate::metrics::PhyloPDCalculator;
use crate::utils::normalization::{Calibration, CsrCalibration};
use crate::utils::organism_matcher::NameLookup;

const PLANT_ID_COL: &str = "wfo_taxon_id";
const ASSOCIATION_ID_COL: &str = "plant_wfo_id";
/// Imputed light values first, raw EIVE-L as fallback.
const LIGHT_COLS: [&str; 2] = ["EIVEres-L_complete", "EIVEres-L"];
const SOIL_PH_COLS: [&str; 2] = ["soil_reaction_eive", "EIVEres-R"];
const NITROGEN_COL: &str = "nitrogen_fixation";

/// Plant, organism and fungi tables held in memory for the process lifetime.
pub struct GuildData {
    /// Plant traits keyed by `wfo_taxon_id`
    pub plants: DataFrame,
    /// Plant-organism associations keyed by `plant_wfo_id`
    pub organisms: DataFrame,
    /// Plant-fungi associations keyed by `plant_wfo_id`
    pub fungi: DataFrame,
}

impl GuildData {
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let plants = load_table(&paths.plants).context("Failed to load plants table")?;
        let organisms = load_table(&paths.organisms).context("Failed to load organisms table")?;
        let fungi = load_table(&paths.fungi).context("Failed to load fungi table")?;

        tracing::info!(
            plants = plants.height(),
            organisms = organisms.height(),
            fungi = fungi.height(),
            "guild tables loaded"
        );
        Ok(Self::from_frames(plants, organisms, fungi))
    }

    pub fn from_frames(plants: DataFrame, organisms: DataFrame, fungi: DataFrame) -> Self {
        Self {
            plants,
            organisms,
            fungi,
        }
    }

    /// Build a typed guild from plant identifiers, keeping the caller's order.
    ///
    /// Fails with `GuildError::MissingPlant` for unknown ids and
    /// `GuildError::MalformedColumn` for columns of an unreadable type; both
    /// are carried inside the `anyhow::Error`.
    pub fn build_guild<S: AsRef<str>>(&self, plant_ids: &[S], climate_tier: &str) -> Result<Guild> {
        let ids: Vec<&str> = plant_ids.iter().map(|s| s.as_ref()).collect();

        let plants = filter_to_guild(&self.plants, &ids, PLANT_ID_COL, "plants")?;
        let organisms = filter_to_guild(&self.organisms, &ids, ASSOCIATION_ID_COL, "organisms")?;
        let fungi = filter_to_guild(&self.fungi, &ids, ASSOCIATION_ID_COL, "fungi")?;

        let plant_rows = row_index(&plants, PLANT_ID_COL)?;
        let organism_rows = row_index(&organisms, ASSOCIATION_ID_COL)?;
        let fungi_rows = row_index(&fungi, ASSOCIATION_ID_COL)?;

        let traits = TraitColumns::new(&plants)?;
        let organism_cols = interaction_columns(&organisms, &Interaction::ORGANISMS)?;
        let fungi_cols = interaction_columns(&fungi, &Interaction::FUNGI)?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            let row = *plant_rows
                .get(*id)
                .ok_or_else(|| GuildError::MissingPlant { id: id.to_string() })?;
            let mut record = traits.record(id, row)?;

            if let Some(&row) = organism_rows.get(*id) {
                read_interactions(&mut record, &organism_cols, row)?;
            }
            if let Some(&row) = fungi_rows.get(*id) {
                read_interactions(&mut record, &fungi_cols, row)?;
            }
            records.push(record);
        }

        tracing::debug!(n_plants = records.len(), tier = %climate_tier, "guild built");
        Ok(Guild::new(records, climate_tier)?)
    }
}

/// Parquet for `.parquet` files, CSV otherwise.
fn load_table(path: &Path) -> Result<DataFrame> {
    let is_parquet = path.extension().map_or(false, |ext| ext == "parquet");
    if is_parquet {
        LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {}", path.display()))?
            .collect()
            .with_context(|| format!("Failed to collect parquet: {}", path.display()))
    } else {
        read_csv(path)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path.display()))
}

/// Filter a table to guild rows with a boolean mask on the id column.
fn filter_to_guild(df: &DataFrame, plant_ids: &[&str], id_col_name: &str, context: &str) -> Result<DataFrame> {
    let id_col = string_column(df, id_col_name)
        .with_context(|| format!("{}: missing {} column", context, id_col_name))?;

    let id_set: rustc_hash::FxHashSet<&str> = plant_ids.iter().copied().collect();
    let mask: BooleanChunked = id_col
        .into_iter()
        .map(|opt| opt.map_or(false, |s| id_set.contains(s)))
        .collect();

    df.filter(&mask)
        .with_context(|| format!("{}: failed to filter to guild plants", context))
}

/// Plant id -> row. The first row wins if a table repeats an id.
fn row_index(df: &DataFrame, id_col_name: &str) -> Result<FxHashMap<String, usize>> {
    let ids = string_column(df, id_col_name)?;
    let mut index = FxHashMap::default();
    for (row, id) in ids.into_iter().enumerate() {
        if let Some(id) = id {
            index.entry(id.to_string()).or_insert(row);
        }
    }
    Ok(index)
}

fn malformed(column: &str, dtype: &DataType) -> GuildError {
    GuildError::MalformedColumn {
        column: column.to_string(),
        dtype: dtype.to_string(),
    }
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let column = df.column(name)?;
    if column.dtype() != &DataType::String {
        return Err(malformed(name, column.dtype()).into());
    }
    Ok(column.str()?)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Optional numeric column cast to f64. Absent column -> `None`.
fn numeric_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    if column.dtype() == &DataType::Null {
        return Ok(None);
    }
    if !is_numeric(column.dtype()) {
        return Err(malformed(name, column.dtype()).into());
    }
    let cast = column.cast(&DataType::Float64)?;
    Ok(Some(cast.f64()?.clone()))
}

/// Optional 0/1 or boolean column. Absent column -> `None`.
fn flag_column(df: &DataFrame, name: &str) -> Result<Option<BooleanChunked>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    match column.dtype() {
        DataType::Null => Ok(None),
        DataType::Boolean => Ok(Some(column.bool()?.clone())),
        dtype if is_numeric(dtype) => Ok(Some(column.cast(&DataType::Boolean)?.bool()?.clone())),
        other => Err(malformed(name, other).into()),
    }
}

fn first_numeric_column(df: &DataFrame, names: &[&str]) -> Result<Option<Float64Chunked>> {
    for name in names {
        if let Some(col) = numeric_column(df, name)? {
            return Ok(Some(col));
        }
    }
    Ok(None)
}

fn optional_string_column(df: &DataFrame, name: &str) -> Result<Option<StringChunked>> {
    match df.column(name) {
        Ok(column) if column.dtype() == &DataType::Null => Ok(None),
        Ok(_) => Ok(Some(string_column(df, name)?.clone())),
        Err(_) => Ok(None),
    }
}

/// Trait columns of the filtered plant table, type-checked once.
struct TraitColumns {
    scientific_name: StringChunked,
    vernacular_name: Option<StringChunked>,
    csr: Option<[Float64Chunked; 3]>,
    height: Option<Float64Chunked>,
    growth_form: Option<StringChunked>,
    light: Option<Float64Chunked>,
    soil_ph: Option<Float64Chunked>,
    nitrogen: Option<StringChunked>,
    /// Only the tier columns the table carries.
    climate: Vec<(&'static str, BooleanChunked)>,
}

impl TraitColumns {
    fn new(plants: &DataFrame) -> Result<Self> {
        let scientific_name = string_column(plants, "wfo_scientific_name")?.clone();
        let csr = match (
            numeric_column(plants, "C")?,
            numeric_column(plants, "S")?,
            numeric_column(plants, "R")?,
        ) {
            (Some(c), Some(s), Some(r)) => Some([c, s, r]),
            _ => None,
        };

        let mut climate = Vec::new();
        for tier in CLIMATE_TIERS {
            if let Some(col) = flag_column(plants, tier)? {
                climate.push((tier, col));
            }
        }

        Ok(Self {
            scientific_name,
            vernacular_name: optional_string_column(plants, "vernacular_name_en")?,
            csr,
            height: numeric_column(plants, "height_m")?,
            growth_form: optional_string_column(plants, "try_growth_form")?,
            light: first_numeric_column(plants, &LIGHT_COLS)?,
            soil_ph: first_numeric_column(plants, &SOIL_PH_COLS)?,
            nitrogen: optional_string_column(plants, NITROGEN_COL)?,
            climate,
        })
    }

    fn record(&self, id: &str, row: usize) -> Result<PlantRecord> {
        let scientific_name = self.scientific_name.get(row).unwrap_or(id);
        let mut record = PlantRecord::new(id, scientific_name);

        record.vernacular_name = self
            .vernacular_name
            .as_ref()
            .and_then(|c| c.get(row))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        if let Some([c, s, r]) = &self.csr {
            if let (Some(c), Some(s), Some(r)) = (c.get(row), s.get(row), r.get(row)) {
                record.csr = Some(CsrScores { c, s, r });
            }
        }
        record.height_m = self.height.as_ref().and_then(|h| h.get(row));
        record.growth_form = self
            .growth_form
            .as_ref()
            .and_then(|g| g.get(row))
            .and_then(GrowthForm::from_label);
        record.light_pref = self.light.as_ref().and_then(|l| l.get(row));
        record.soil_ph = self.soil_ph.as_ref().and_then(|p| p.get(row));
        record.nitrogen_fixer = self
            .nitrogen
            .as_ref()
            .and_then(|n| n.get(row))
            .and_then(nitrogen_fixer_from_label);
        if !self.climate.is_empty() {
            // A null cell leaves the plant's tiers unknown rather than "none".
            let cells: Vec<Option<bool>> = self.climate.iter().map(|(_, col)| col.get(row)).collect();
            if cells.iter().any(Option::is_some) {
                record.climate_tiers = Some(
                    self.climate
                        .iter()
                        .zip(&cells)
                        .filter(|(_, cell)| **cell == Some(true))
                        .map(|((tier, _), _)| tier.to_string())
                        .collect(),
                );
            }
        }

        Ok(record)
    }
}

/// How an interaction column stores its names.
enum ListColumn {
    List(ListChunked),
    Piped(StringChunked),
    /// All-null column: every cell reads as an empty list.
    Empty,
}

fn interaction_columns(df: &DataFrame, categories: &[Interaction]) -> Result<Vec<(Interaction, ListColumn)>> {
    let mut out = Vec::new();
    for &category in categories {
        let name = category.column_name();
        let Ok(column) = df.column(name) else {
            continue;
        };
        let parsed = match column.dtype() {
            DataType::List(inner) if matches!(inner.as_ref(), DataType::String | DataType::Null) => {
                ListColumn::List(column.list()?.clone())
            }
            DataType::String => ListColumn::Piped(column.str()?.clone()),
            DataType::Null => ListColumn::Empty,
            other => return Err(malformed(name, other).into()),
        };
        out.push((category, parsed));
    }
    Ok(out)
}

fn read_interactions(record: &mut PlantRecord, columns: &[(Interaction, ListColumn)], row: usize) -> Result<()> {
    for (category, column) in columns {
        let mut names = BTreeSet::new();
        match column {
            ListColumn::List(list) => {
                if let Some(series) = list.get_as_series(row) {
                    if series.dtype() == &DataType::String {
                        for name in series.str()?.into_iter().flatten() {
                            push_name(&mut names, name);
                        }
                    }
                }
            }
            ListColumn::Piped(strings) => {
                if let Some(cell) = strings.get(row) {
                    for name in cell.split('|') {
                        push_name(&mut names, name);
                    }
                }
            }
            ListColumn::Empty => {}
        }
        record.interactions.insert(*category, names);
    }
    Ok(())
}

fn push_name(names: &mut BTreeSet<String>, raw: &str) {
    let name = raw.trim();
    if !name.is_empty() {
        names.insert(name.to_string());
    }
}

/// Load lookup table: key -> pipe-separated values.
///
/// Example: herbivore -> "predator1|predator2|predator3"
pub fn load_lookup_table(path: impl AsRef<Path>, key_col: &str, value_col: &str) -> Result<NameLookup> {
    let path = path.as_ref();
    let df = read_csv(path).with_context(|| format!("Failed to load lookup table: {}", path.display()))?;

    let keys = df
        .column(key_col)
        .with_context(|| format!("Column '{}' not found", key_col))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", key_col))?;
    let values = df
        .column(value_col)
        .with_context(|| format!("Column '{}' not found", value_col))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", value_col))?;

    let entries = keys
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(k, v)| Some((k?, v?.split('|').filter(|s| !s.trim().is_empty()))));
    Ok(NameLookup::from_entries(entries))
}

/// Two-column `genus,category` CSV.
fn load_organism_categories(path: &Path) -> Result<Vec<(String, String)>> {
    let df = read_csv(path).with_context(|| format!("Failed to load organism categories: {}", path.display()))?;
    let genera = df.column("genus")?.str()?;
    let labels = df.column("category")?.str()?;
    Ok(genera
        .into_iter()
        .zip(labels.into_iter())
        .filter_map(|(g, c)| Some((g?.to_string(), c?.to_string())))
        .collect())
}

/// Load every curated table, the calibrations and the phylogeny.
pub fn load_lookup_tables(paths: &DataPaths) -> Result<LookupTables> {
    let calibration = Calibration::load(&paths.calibration)?;
    let phylo = PhyloPDCalculator::load(&paths.tree, paths.tree_mapping.as_deref())?;

    let herbivore_predators = load_lookup_table(&paths.herbivore_predators, "herbivore", "predators")?;
    let insect_parasites = load_lookup_table(&paths.insect_parasites, "herbivore", "entomopathogenic_fungi")?;
    let pathogen_antagonists = load_lookup_table(&paths.pathogen_antagonists, "pathogen", "antagonists")?;

    tracing::info!(
        herbivore_predators = herbivore_predators.len(),
        insect_parasites = insect_parasites.len(),
        pathogen_antagonists = pathogen_antagonists.len(),
        tiers = calibration.tier_names().count(),
        "lookup tables loaded"
    );

    let mut lookups = LookupTables::new(calibration, phylo)
        .with_herbivore_predators(herbivore_predators)
        .with_insect_parasites(insect_parasites)
        .with_pathogen_antagonists(pathogen_antagonists);

    if let Some(path) = &paths.organism_categories {
        lookups = lookups.with_organism_categories(load_organism_categories(path)?);
    }
    if let Some(path) = &paths.csr_calibration {
        lookups = lookups.with_csr_calibration(CsrCalibration::load(path)?);
    }
    Ok(lookups)
}
