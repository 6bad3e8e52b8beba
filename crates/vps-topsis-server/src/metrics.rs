use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct RouteMetric {
    ok: u64,
    client_err: u64,
    server_err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

#[derive(Debug, Default)]
pub(crate) struct MetricsRegistry {
    routes: HashMap<&'static str, RouteMetric>,
    rankings_total: u64,
    alternatives_ranked_total: u64,
}

impl MetricsRegistry {
    pub(crate) fn record_request(&mut self, route: &'static str, status: u16, latency_ms: f64) {
        let m = self.routes.entry(route).or_default();
        match status {
            0..=399 => m.ok = m.ok.saturating_add(1),
            400..=499 => m.client_err = m.client_err.saturating_add(1),
            _ => m.server_err = m.server_err.saturating_add(1),
        }
        m.total_latency_ms += latency_ms.max(0.0);
        m.max_latency_ms = m.max_latency_ms.max(latency_ms);
    }

    pub(crate) fn record_ranking(&mut self, alternatives: usize) {
        self.rankings_total = self.rankings_total.saturating_add(1);
        self.alternatives_ranked_total = self
            .alternatives_ranked_total
            .saturating_add(u64::try_from(alternatives).unwrap_or(u64::MAX));
    }

    pub(crate) fn render(&self, catalog_entries: usize, history_entries: usize) -> String {
        let mut lines = vec![
            "# TYPE vps_topsis_http_requests_total counter".to_string(),
            "# TYPE vps_topsis_http_latency_ms_sum counter".to_string(),
            "# TYPE vps_topsis_http_latency_ms_count counter".to_string(),
            "# TYPE vps_topsis_http_latency_ms_max gauge".to_string(),
            "# TYPE vps_topsis_rankings_total counter".to_string(),
            "# TYPE vps_topsis_alternatives_ranked_total counter".to_string(),
            "# TYPE vps_topsis_catalog_entries gauge".to_string(),
            "# TYPE vps_topsis_history_entries gauge".to_string(),
        ];

        let mut routes = self.routes.keys().copied().collect::<Vec<_>>();
        routes.sort_unstable();
        for route in routes {
            let Some(m) = self.routes.get(route) else {
                continue;
            };
            let label = prom_label_value(route);
            for (class, count) in [
                ("ok", m.ok),
                ("client_error", m.client_err),
                ("server_error", m.server_err),
            ] {
                lines.push(format!(
                    "vps_topsis_http_requests_total{{route=\"{label}\",status=\"{class}\"}} {count}"
                ));
            }
            lines.push(format!(
                "vps_topsis_http_latency_ms_sum{{route=\"{label}\"}} {:.3}",
                m.total_latency_ms
            ));
            lines.push(format!(
                "vps_topsis_http_latency_ms_count{{route=\"{label}\"}} {}",
                m.ok + m.client_err + m.server_err
            ));
            lines.push(format!(
                "vps_topsis_http_latency_ms_max{{route=\"{label}\"}} {:.3}",
                m.max_latency_ms
            ));
        }

        lines.push(format!("vps_topsis_rankings_total {}", self.rankings_total));
        lines.push(format!(
            "vps_topsis_alternatives_ranked_total {}",
            self.alternatives_ranked_total
        ));
        lines.push(format!("vps_topsis_catalog_entries {catalog_entries}"));
        lines.push(format!("vps_topsis_history_entries {history_entries}"));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

fn prom_label_value(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_route_counters_by_status_class() {
        let mut registry = MetricsRegistry::default();
        registry.record_request("/api/rank", 200, 1.5);
        registry.record_request("/api/rank", 400, 0.5);
        registry.record_request("/api/rank", 500, 2.0);
        registry.record_ranking(3);

        let text = registry.render(7, 2);
        assert!(text.contains(
            "vps_topsis_http_requests_total{route=\"/api/rank\",status=\"ok\"} 1"
        ));
        assert!(text.contains(
            "vps_topsis_http_requests_total{route=\"/api/rank\",status=\"client_error\"} 1"
        ));
        assert!(text.contains("vps_topsis_http_latency_ms_count{route=\"/api/rank\"} 3"));
        assert!(text.contains("vps_topsis_http_latency_ms_max{route=\"/api/rank\"} 2.000"));
        assert!(text.contains("vps_topsis_alternatives_ranked_total 3"));
        assert!(text.contains("vps_topsis_catalog_entries 7"));
        assert!(text.ends_with("vps_topsis_history_entries 2\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(prom_label_value("a\"b\\c\nd"), "a\\\"b\\\\c d");
    }
}
