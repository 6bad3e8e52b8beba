use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use vps_topsis_core::{rank, Alternative, Direction, RankRequest};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    alternatives: Vec<Alternative>,
    weights: Vec<f64>,
    directions: Vec<Direction>,
    #[serde(default)]
    expected: Vec<Expected>,
    #[serde(default)]
    expected_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Expected {
    id: String,
    rank: usize,
    score: f64,
    d_plus: f64,
    d_minus: f64,
}

const TOLERANCE: f64 = 1e-9;

#[test]
fn golden_cases_pass() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let fixture = root
        .join("..")
        .join("..")
        .join("data")
        .join("golden")
        .join("topsis_cases.json");

    let content = fs::read_to_string(&fixture)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", fixture.display()));
    let cases: Vec<Case> = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", fixture.display()));
    assert!(!cases.is_empty());

    for case in cases {
        let request = RankRequest {
            alternatives: case.alternatives,
            weights: case.weights,
            directions: case.directions,
        };
        let out = rank(&request);

        if let Some(code) = case.expected_error {
            let err = out.expect_err(&format!("case {} should fail", case.name));
            assert_eq!(err.code(), code, "case {} failed", case.name);
            continue;
        }

        let ranking = out.unwrap_or_else(|e| panic!("case {} failed: {e}", case.name));
        assert_eq!(
            ranking.results.len(),
            case.expected.len(),
            "case {} failed",
            case.name
        );
        for (got, want) in ranking.results.iter().zip(&case.expected) {
            assert_eq!(got.id, want.id, "case {} order", case.name);
            assert_eq!(got.rank, want.rank, "case {} rank of {}", case.name, want.id);
            assert!(
                (got.score - want.score).abs() < TOLERANCE,
                "case {} score of {}: {} vs {}",
                case.name,
                want.id,
                got.score,
                want.score
            );
            assert!((got.d_plus - want.d_plus).abs() < TOLERANCE, "case {}", case.name);
            assert!((got.d_minus - want.d_minus).abs() < TOLERANCE, "case {}", case.name);
        }
    }
}
