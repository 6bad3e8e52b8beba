//! Criteria catalogue for ranking VPS plans.
//!
//! Column order everywhere is CPU, RAM, Disk I/O, Price.

use serde::{Deserialize, Serialize};

use crate::error::TopsisError;
use crate::types::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VpsCriterion {
    Cpu,
    Ram,
    DiskIo,
    Price,
}

pub const VPS_CRITERIA: [VpsCriterion; 4] = [
    VpsCriterion::Cpu,
    VpsCriterion::Ram,
    VpsCriterion::DiskIo,
    VpsCriterion::Price,
];

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

const CPU_SCALE: [f64; 5] = [2.0, 4.0, 6.0, 8.0, 10.0];
const RAM_SCALE: [f64; 5] = [2.0, 4.0, 8.0, 16.0, 32.0];
const DISK_IO_SCALE: [f64; 5] = [150.0, 300.0, 500.0, 700.0, 1000.0];
const PRICE_SCALE: [f64; 5] = [15.0, 35.0, 75.0, 150.0, 250.0];

// Upper bounds of levels 1..=4; anything above the last bound is level 5.
const CPU_BANDS: [f64; 4] = [2.0, 4.0, 6.0, 8.0];
const RAM_BANDS: [f64; 4] = [2.0, 4.0, 8.0, 16.0];
const DISK_IO_BANDS: [f64; 4] = [200.0, 400.0, 600.0, 800.0];
const PRICE_BANDS: [f64; 4] = [20.0, 50.0, 100.0, 200.0];

const CAPACITY_LEVEL_NAMES: [&str; 5] = ["very low", "low", "medium", "high", "very high"];
const PRICE_LEVEL_NAMES: [&str; 5] = ["very cheap", "cheap", "medium", "expensive", "very expensive"];

impl VpsCriterion {
    pub fn key(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::DiskIo => "disk",
            Self::Price => "price",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Ram => "RAM",
            Self::DiskIo => "Disk I/O",
            Self::Price => "Price",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Cpu => "cores",
            Self::Ram => "GB",
            Self::DiskIo => "MB/s",
            Self::Price => "USD/month",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::Price => Direction::Cost,
            Self::Cpu | Self::Ram | Self::DiskIo => Direction::Benefit,
        }
    }

    pub fn column(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Ram => 1,
            Self::DiskIo => 2,
            Self::Price => 3,
        }
    }

    /// Accepts the key, the label, or a few common spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Self::Cpu),
            "ram" | "memory" => Some(Self::Ram),
            "disk" | "disk_io" | "diskio" | "disk i/o" => Some(Self::DiskIo),
            "price" | "cost" | "harga" => Some(Self::Price),
            _ => None,
        }
    }

    /// Numeric value for an ordinal level on this criterion's scale.
    pub fn scale(self) -> &'static [f64; 5] {
        match self {
            Self::Cpu => &CPU_SCALE,
            Self::Ram => &RAM_SCALE,
            Self::DiskIo => &DISK_IO_SCALE,
            Self::Price => &PRICE_SCALE,
        }
    }

    pub fn value_for_level(self, level: u8) -> Result<f64, TopsisError> {
        usize::from(level)
            .checked_sub(1)
            .and_then(|idx| self.scale().get(idx))
            .copied()
            .ok_or_else(|| {
                TopsisError::InvalidMatrix(format!(
                    "{} level {level} is outside {MIN_LEVEL}..={MAX_LEVEL}",
                    self.label()
                ))
            })
    }

    /// Classifies a raw value into a 1..=5 level.
    pub fn level_for_value(self, value: f64) -> u8 {
        let bands = match self {
            Self::Cpu => &CPU_BANDS,
            Self::Ram => &RAM_BANDS,
            Self::DiskIo => &DISK_IO_BANDS,
            Self::Price => &PRICE_BANDS,
        };
        let below = bands.iter().take_while(|upper| value > **upper).count();
        MIN_LEVEL + u8::try_from(below).unwrap_or(MAX_LEVEL - MIN_LEVEL)
    }

    pub fn level_name(self, level: u8) -> &'static str {
        let names = match self {
            Self::Price => &PRICE_LEVEL_NAMES,
            _ => &CAPACITY_LEVEL_NAMES,
        };
        usize::from(level)
            .checked_sub(1)
            .and_then(|idx| names.get(idx))
            .copied()
            .unwrap_or("unknown")
    }
}

pub fn vps_directions() -> Vec<Direction> {
    VPS_CRITERIA.iter().map(|c| c.direction()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VpsWeights {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub price: f64,
}

impl VpsWeights {
    pub fn new(cpu: f64, ram: f64, disk: f64, price: f64) -> Self {
        Self {
            cpu,
            ram,
            disk,
            price,
        }
    }

    pub fn to_vec(self) -> Vec<f64> {
        vec![self.cpu, self.ram, self.disk, self.price]
    }

    pub fn from_vec(weights: &[f64]) -> Result<Self, TopsisError> {
        match weights {
            [cpu, ram, disk, price] => Ok(Self::new(*cpu, *ram, *disk, *price)),
            _ => Err(TopsisError::InvalidWeights(format!(
                "expected 4 weights, got {}",
                weights.len()
            ))),
        }
    }

    pub fn get(self, criterion: VpsCriterion) -> f64 {
        match criterion {
            VpsCriterion::Cpu => self.cpu,
            VpsCriterion::Ram => self.ram,
            VpsCriterion::DiskIo => self.disk,
            VpsCriterion::Price => self.price,
        }
    }
}
