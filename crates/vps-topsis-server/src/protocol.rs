//! Wire types for the HTTP and stdio surfaces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vps_topsis_core::{
    Alternative, Direction, RankRequest, RankedAlternative, Ranking, TopsisBreakdown, TopsisError,
    VpsCriterion, VpsWeights, MAX_LEVEL, MIN_LEVEL,
};
use vps_topsis_presets::WeightPreset;
use vps_topsis_storage::{CatalogEntry, NewCatalogEntry};

/// Alternative as it arrives on the wire. Values stay loosely typed so that a
/// missing or non-numeric cell is reported as a matrix error, not a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct WireAlternative {
    pub id: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRankRequest {
    pub alternatives: Vec<WireAlternative>,
    #[serde(default)]
    pub weights: Vec<Value>,
    pub directions: Vec<Direction>,
}

impl WireRankRequest {
    pub fn into_request(self) -> RankRequest {
        RankRequest {
            alternatives: wire_alternatives(self.alternatives),
            weights: numbers(&self.weights),
            directions: self.directions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireBatchRequest {
    pub alternatives: Vec<WireAlternative>,
    pub directions: Vec<Direction>,
    pub weight_sets: Vec<Vec<Value>>,
}

impl WireBatchRequest {
    pub fn into_parts(self) -> (Vec<Alternative>, Vec<Direction>, Vec<Vec<f64>>) {
        let sets = self.weight_sets.iter().map(|set| numbers(set)).collect();
        (wire_alternatives(self.alternatives), self.directions, sets)
    }
}

fn wire_alternatives(raw: Vec<WireAlternative>) -> Vec<Alternative> {
    raw.into_iter()
        .map(|a| Alternative::new(a.id, numbers(&a.values)))
        .collect()
}

fn numbers(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.as_f64().unwrap_or(f64::NAN))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankResult {
    pub id: String,
    pub score: f64,
    pub rank: usize,
    pub d_plus: f64,
    pub d_minus: f64,
}

impl From<&RankedAlternative> for RankResult {
    fn from(r: &RankedAlternative) -> Self {
        Self {
            id: r.id.clone(),
            score: r.score,
            rank: r.rank,
            d_plus: r.d_plus,
            d_minus: r.d_minus,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankResponse {
    pub results: Vec<RankResult>,
}

impl From<&Ranking> for RankResponse {
    fn from(ranking: &Ranking) -> Self {
        Self {
            results: ranking.results.iter().map(RankResult::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&TopsisError> for ErrorBody {
    fn from(err: &TopsisError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub weights: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RankResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Catalog entry payload. Each criterion is given either as a raw value or as
/// a 1..=5 level; the raw value wins when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorPayload {
    pub vendor: String,
    #[serde(default, alias = "nama_paket")]
    pub plan: String,
    pub cpu: Option<f64>,
    pub ram: Option<f64>,
    #[serde(alias = "disk")]
    pub disk_io: Option<f64>,
    pub price: Option<f64>,
    pub cpu_level: Option<u8>,
    pub ram_level: Option<u8>,
    #[serde(alias = "disk_level")]
    pub diskio_level: Option<u8>,
    pub price_level: Option<u8>,
}

impl VendorPayload {
    pub fn resolve(self) -> Result<NewCatalogEntry, TopsisError> {
        let cpu = resolve_value(VpsCriterion::Cpu, self.cpu, self.cpu_level)?;
        let ram = resolve_value(VpsCriterion::Ram, self.ram, self.ram_level)?;
        let disk_io = resolve_value(VpsCriterion::DiskIo, self.disk_io, self.diskio_level)?;
        let price = resolve_value(VpsCriterion::Price, self.price, self.price_level)?;
        Ok(NewCatalogEntry {
            vendor: self.vendor,
            plan: self.plan,
            cpu,
            ram,
            disk_io,
            price,
        })
    }
}

fn resolve_value(
    criterion: VpsCriterion,
    raw: Option<f64>,
    level: Option<u8>,
) -> Result<f64, TopsisError> {
    match (raw, level) {
        (Some(v), _) => Ok(v),
        (None, Some(level)) => criterion.value_for_level(level),
        (None, None) => Err(TopsisError::InvalidMatrix(format!(
            "missing {} value: provide `{}` or `{}_level`",
            criterion.label(),
            criterion.key(),
            criterion.key()
        ))),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub no: u32,
    pub vendor: String,
    pub plan: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk_io: f64,
    pub price: f64,
    pub cpu_level: u8,
    pub ram_level: u8,
    pub diskio_level: u8,
    pub price_level: u8,
}

impl From<&CatalogEntry> for CatalogItem {
    fn from(e: &CatalogEntry) -> Self {
        Self {
            no: e.no,
            vendor: e.vendor.clone(),
            plan: e.plan.clone(),
            cpu: e.cpu,
            ram: e.ram,
            disk_io: e.disk_io,
            price: e.price,
            cpu_level: VpsCriterion::Cpu.level_for_value(e.cpu),
            ram_level: VpsCriterion::Ram.level_for_value(e.ram),
            diskio_level: VpsCriterion::DiskIo.level_for_value(e.disk_io),
            price_level: VpsCriterion::Price.level_for_value(e.price),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogRanking {
    pub rank: usize,
    pub no: u32,
    pub vendor: String,
    pub plan: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk_io: f64,
    pub price: f64,
    pub score: f64,
    pub d_plus: f64,
    pub d_minus: f64,
}

impl CatalogRanking {
    pub fn new(entry: &CatalogEntry, ranked: &RankedAlternative) -> Self {
        Self {
            rank: ranked.rank,
            no: entry.no,
            vendor: entry.vendor.clone(),
            plan: entry.plan.clone(),
            cpu: entry.cpu,
            ram: entry.ram,
            disk_io: entry.disk_io,
            price: entry.price,
            score: ranked.score,
            d_plus: ranked.d_plus,
            d_minus: ranked.d_minus,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculateResponse {
    pub weights: VpsWeights,
    pub rankings: Vec<CatalogRanking>,
    pub top_recommendation: Option<CatalogRanking>,
    pub ideal_positive: Vec<f64>,
    pub ideal_negative: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub direction: Direction,
    pub levels: Vec<f64>,
    pub level_names: Vec<&'static str>,
}

impl From<VpsCriterion> for CriterionInfo {
    fn from(c: VpsCriterion) -> Self {
        Self {
            key: c.key(),
            label: c.label(),
            unit: c.unit(),
            direction: c.direction(),
            levels: c.scale().to_vec(),
            level_names: (MIN_LEVEL..=MAX_LEVEL).map(|l| c.level_name(l)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Formulas {
    pub normalization: &'static str,
    pub weighted: &'static str,
    pub distance_pos: &'static str,
    pub distance_neg: &'static str,
    pub score: &'static str,
}

pub const FORMULAS: Formulas = Formulas {
    normalization: "r_ij = x_ij / sqrt(sum_i x_ij^2)",
    weighted: "y_ij = w_j * r_ij",
    distance_pos: "D+_i = sqrt(sum_j (y_ij - A+_j)^2)",
    distance_neg: "D-_i = sqrt(sum_j (y_ij - A-_j)^2)",
    score: "score_i = D-_i / (D+_i + D-_i)",
};

#[derive(Debug, Clone, Serialize)]
pub struct CalculationDetail {
    pub weights: VpsWeights,
    pub criteria: Vec<CriterionInfo>,
    pub formulas: Formulas,
    pub vendors: Vec<String>,
    pub breakdown: TopsisBreakdown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensitivityPayload {
    #[serde(default = "default_sweep_criterion")]
    pub criterion: String,
    #[serde(default = "default_sweep_start")]
    pub start: f64,
    #[serde(default = "default_sweep_end")]
    pub end: f64,
    #[serde(default = "default_sweep_step")]
    pub step: f64,
    /// Ranked entries reported per point.
    #[serde(default = "default_sweep_top")]
    pub top: usize,
}

fn default_sweep_criterion() -> String {
    "cpu".to_string()
}

fn default_sweep_start() -> f64 {
    0.1
}

fn default_sweep_end() -> f64 {
    0.5
}

fn default_sweep_step() -> f64 {
    0.1
}

fn default_sweep_top() -> usize {
    5
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityPointView {
    pub weight: f64,
    pub weights: VpsWeights,
    pub rankings: Vec<CatalogRanking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityResponse {
    pub criterion: VpsCriterion,
    pub points: Vec<SensitivityPointView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub weights: VpsWeights,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub weights: VpsWeights,
}

impl From<&WeightPreset> for PresetView {
    fn from(preset: &WeightPreset) -> Self {
        Self {
            id: preset.id,
            name: preset.name,
            description: preset.description,
            weights: preset.weights,
        }
    }
}
