use vps_topsis_core::VpsWeights;

pub const DEFAULT_PRESET_ID: &str = "balanced";

#[derive(Debug, Clone, Copy)]
pub struct WeightPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub weights: VpsWeights,
}

static PRESETS: [WeightPreset; 4] = [
    WeightPreset {
        id: "balanced",
        name: "Balanced",
        description: "Every criterion counts the same.",
        weights: VpsWeights {
            cpu: 0.25,
            ram: 0.25,
            disk: 0.25,
            price: 0.25,
        },
    },
    WeightPreset {
        id: "performance",
        name: "Performance",
        description: "Compute and memory first, price matters little.",
        weights: VpsWeights {
            cpu: 0.35,
            ram: 0.35,
            disk: 0.20,
            price: 0.10,
        },
    },
    WeightPreset {
        id: "budget",
        name: "Budget",
        description: "Cheapest plan that is still usable.",
        weights: VpsWeights {
            cpu: 0.15,
            ram: 0.15,
            disk: 0.15,
            price: 0.55,
        },
    },
    WeightPreset {
        id: "storage",
        name: "Storage",
        description: "Disk throughput dominates.",
        weights: VpsWeights {
            cpu: 0.15,
            ram: 0.15,
            disk: 0.55,
            price: 0.15,
        },
    },
];

pub fn presets() -> &'static [WeightPreset] {
    &PRESETS
}

pub fn preset(id: &str) -> Option<&'static WeightPreset> {
    PRESETS
        .iter()
        .find(|preset| preset.id.eq_ignore_ascii_case(id.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vps_topsis_core::{validate_weights, VPS_CRITERIA};

    #[test]
    fn every_preset_is_a_valid_weight_vector() {
        for preset in presets() {
            assert!(
                validate_weights(&preset.weights.to_vec(), VPS_CRITERIA.len()).is_ok(),
                "{}",
                preset.id
            );
            assert!((preset.weights.to_vec().iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(preset("Budget").map(|p| p.weights.price), Some(0.55));
        assert!(preset(DEFAULT_PRESET_ID).is_some());
        assert!(preset("gpu").is_none());
    }
}
