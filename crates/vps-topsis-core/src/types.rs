use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Higher raw values are preferred.
    Benefit,
    /// Lower raw values are preferred.
    Cost,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Benefit => "benefit",
            Self::Cost => "cost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: String,
    pub values: Vec<f64>,
}

impl Alternative {
    pub fn new(id: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRequest {
    pub alternatives: Vec<Alternative>,
    pub weights: Vec<f64>,
    pub directions: Vec<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub id: String,
    /// Position of the alternative in the request.
    pub index: usize,
    pub score: f64,
    pub rank: usize,
    pub d_plus: f64,
    pub d_minus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Sorted by rank ascending.
    pub results: Vec<RankedAlternative>,
    pub ideal_positive: Vec<f64>,
    pub ideal_negative: Vec<f64>,
}

impl Ranking {
    pub fn top(&self) -> Option<&RankedAlternative> {
        self.results.first()
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.results.iter().find(|r| r.id == id).map(|r| r.rank)
    }
}

/// Every intermediate of one computation, rows in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopsisBreakdown {
    pub ids: Vec<String>,
    pub weights: Vec<f64>,
    pub directions: Vec<Direction>,
    pub decision: Vec<Vec<f64>>,
    pub column_norms: Vec<f64>,
    pub normalized: Vec<Vec<f64>>,
    pub weighted: Vec<Vec<f64>>,
    pub ideal_positive: Vec<f64>,
    pub ideal_negative: Vec<f64>,
    pub d_plus: Vec<f64>,
    pub d_minus: Vec<f64>,
    pub scores: Vec<f64>,
    pub ranks: Vec<usize>,
}
