use vps_topsis_core::{rank, vps_directions, Alternative, Direction, RankRequest};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 11) as f64) / ((1_u64 << 53) as f64)
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn random_request(rng: &mut Lcg, n: usize) -> RankRequest {
    let alternatives = (0..n)
        .map(|i| {
            Alternative::new(
                format!("plan-{i}"),
                vec![
                    rng.range(1.0, 16.0),
                    rng.range(1.0, 64.0),
                    rng.range(100.0, 1200.0),
                    rng.range(5.0, 300.0),
                ],
            )
        })
        .collect();
    let raw: Vec<f64> = (0..4).map(|_| rng.range(0.05, 1.0)).collect();
    let total: f64 = raw.iter().sum();
    RankRequest {
        alternatives,
        weights: raw.iter().map(|w| w / total).collect(),
        directions: vps_directions(),
    }
}

fn score_of(request: &RankRequest, id: &str) -> f64 {
    rank(request)
        .expect("valid request")
        .results
        .into_iter()
        .find(|r| r.id == id)
        .map(|r| r.score)
        .expect("id present")
}

#[test]
fn scores_stay_in_unit_interval_and_ranks_follow_scores() {
    let mut rng = Lcg(7);
    for round in 0..200 {
        let n = 1 + round % 9;
        let request = random_request(&mut rng, n);
        let ranking = rank(&request).expect("valid request");

        assert_eq!(ranking.results.len(), n);
        for (pos, r) in ranking.results.iter().enumerate() {
            assert!((0.0..=1.0).contains(&r.score), "score {}", r.score);
            assert!(r.d_plus >= 0.0 && r.d_minus >= 0.0);
            assert_eq!(r.rank, pos + 1);
        }
        for a in &ranking.results {
            for b in &ranking.results {
                if a.score > b.score {
                    assert!(a.rank < b.rank);
                }
            }
        }
    }
}

#[test]
fn raising_a_benefit_value_never_lowers_the_score() {
    let mut rng = Lcg(11);
    for _ in 0..100 {
        let base = random_request(&mut rng, 5);
        for column in 0..3 {
            let before = score_of(&base, "plan-2");
            let mut bumped = base.clone();
            bumped.alternatives[2].values[column] *= 1.5;
            let after = score_of(&bumped, "plan-2");
            assert!(after + 1e-12 >= before, "column {column}: {before} -> {after}");
        }
    }
}

#[test]
fn raising_a_cost_value_never_raises_the_score() {
    let mut rng = Lcg(13);
    for _ in 0..100 {
        let base = random_request(&mut rng, 5);
        let before = score_of(&base, "plan-1");
        let mut bumped = base.clone();
        bumped.alternatives[1].values[3] *= 1.5;
        let after = score_of(&bumped, "plan-1");
        assert!(after <= before + 1e-12, "{before} -> {after}");
    }
}

#[test]
fn repeated_calls_are_identical() {
    let mut rng = Lcg(17);
    let request = random_request(&mut rng, 6);
    let first = rank(&request).expect("first");
    let second = rank(&request).expect("second");
    assert_eq!(first, second);
}

#[test]
fn scaling_a_column_leaves_scores_unchanged() {
    let mut rng = Lcg(19);
    for _ in 0..50 {
        let request = random_request(&mut rng, 6);
        let mut scaled = request.clone();
        for alt in &mut scaled.alternatives {
            // GB -> MB on the RAM column
            alt.values[1] *= 1024.0;
        }

        let a = rank(&request).expect("a");
        let b = rank(&scaled).expect("b");
        for (x, y) in a.results.iter().zip(&b.results) {
            assert_eq!(x.id, y.id);
            assert!((x.score - y.score).abs() < 1e-9);
        }
    }
}

#[test]
fn weight_sum_outside_tolerance_is_rejected_for_any_matrix() {
    let mut rng = Lcg(23);
    for _ in 0..20 {
        let mut request = random_request(&mut rng, 4);
        request.weights = vec![0.3, 0.3, 0.3, 0.3];
        assert_eq!(rank(&request).expect_err("reject").code(), "invalid_weights");
        request.weights = vec![0.2, 0.2, 0.2, 0.2];
        assert_eq!(rank(&request).expect_err("reject").code(), "invalid_weights");
    }
}

#[test]
fn direction_is_a_parameter_not_domain_knowledge() {
    let alternatives = vec![
        Alternative::new("low", vec![1.0]),
        Alternative::new("high", vec![9.0]),
    ];
    let benefit = rank(&RankRequest {
        alternatives: alternatives.clone(),
        weights: vec![1.0],
        directions: vec![Direction::Benefit],
    })
    .expect("benefit");
    let cost = rank(&RankRequest {
        alternatives,
        weights: vec![1.0],
        directions: vec![Direction::Cost],
    })
    .expect("cost");
    assert_eq!(benefit.results[0].id, "high");
    assert_eq!(cost.results[0].id, "low");
}
