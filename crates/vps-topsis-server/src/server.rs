use std::io::{self, BufRead, Write};
use std::net::{TcpListener, TcpStream};
use std::str::FromStr;
use std::time::Instant;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use vps_topsis_core::{
    Alternative, RankRequest, Ranking, SensitivitySweep, VPS_CRITERIA, VpsCriterion, VpsWeights,
    breakdown, rank, rank_batch, run_sweep, vps_directions,
};
use vps_topsis_presets::{DEFAULT_PRESET_ID, preset, presets};
use vps_topsis_storage::{
    CatalogBackend, CatalogEntry, CatalogStore, HistoryBackend, HistoryRanking, HistoryStore,
    HistoryWeights, NewHistoryEntry,
};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, read_http_request, write_http_response};
use crate::metrics::MetricsRegistry;
use crate::protocol::{
    BatchItem, CalculateResponse, CalculationDetail, CatalogItem, CatalogRanking, CriterionInfo,
    ErrorBody, FORMULAS, HistoryPayload, PresetView, RankResponse, RankResult,
    SensitivityPayload, SensitivityPointView, SensitivityResponse, VendorPayload,
    WireBatchRequest, WireRankRequest,
};

const UNMATCHED_ROUTE: &str = "unmatched";

pub struct RankingServer {
    catalog: Mutex<Box<dyn CatalogBackend>>,
    history: Mutex<Box<dyn HistoryBackend>>,
    metrics: Mutex<MetricsRegistry>,
    max_batch: usize,
}

impl RankingServer {
    /// Opens the JSON-file stores named by `config`.
    pub fn open(config: &ServerConfig) -> Result<Self, ApiError> {
        let catalog = CatalogStore::open(&config.catalog_path)?;
        let history = HistoryStore::open_with_limit(&config.history_path, config.history_limit)?;
        Ok(Self::with_backends(
            Box::new(catalog),
            Box::new(history),
            config.max_batch,
        ))
    }

    pub fn with_backends(
        catalog: Box<dyn CatalogBackend>,
        history: Box<dyn HistoryBackend>,
        max_batch: usize,
    ) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            history: Mutex::new(history),
            metrics: Mutex::new(MetricsRegistry::default()),
            max_batch: max_batch.max(1),
        }
    }

    /// Routes one request and records it in the metrics registry.
    pub fn handle(&self, req: &HttpRequest) -> HttpResponse {
        let started = Instant::now();
        let segments = path_segments(&req.path);
        let route = route_label(&segments);

        let response = match self.route(req, &segments) {
            Ok(response) => response,
            Err(err) => {
                if err.status() >= 500 {
                    tracing::warn!(method = %req.method, path = %req.path, error = %err, "request failed");
                } else {
                    tracing::debug!(method = %req.method, path = %req.path, code = err.code(), error = %err, "request rejected");
                }
                err.to_response()
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics
            .lock()
            .record_request(route, response.status, latency_ms);
        tracing::info!(
            method = %req.method,
            path = %req.path,
            status = response.status,
            latency_ms,
            "request handled"
        );
        response
    }

    /// Answers one line of the stdio transport: a generic rank request in,
    /// a `{results}` document or an error object out.
    pub fn handle_line(&self, line: &str) -> Value {
        let outcome = serde_json::from_str::<WireRankRequest>(line)
            .map_err(|err| ApiError::BadRequest(format!("parse error: {err}")))
            .and_then(|wire| {
                let request = wire.into_request();
                let ranking = rank(&request)?;
                self.metrics.lock().record_ranking(request.alternatives.len());
                Ok(ranking)
            });
        match outcome {
            Ok(ranking) => json!(RankResponse::from(&ranking)),
            Err(err) => json!({"error": err.code(), "message": err.to_string()}),
        }
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        let mut stdout = io::stdout();
        let mut line = String::new();
        tracing::info!("vps-topsisd stdio transport ready");

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let response = self.handle_line(trimmed);
            let serialized = serde_json::to_string(&response)?;
            writeln!(stdout, "{serialized}")?;
            stdout.flush()?;
        }

        Ok(())
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!(addr = %listener.local_addr()?, "vps-topsisd http listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        tracing::warn!(error = %err, "http request error");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let req = match read_http_request(&stream) {
            Ok(Some(req)) => req,
            Ok(None) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                let response = ApiError::BadRequest(err.to_string()).to_response();
                return write_http_response(&mut stream, &response);
            }
            Err(err) => return Err(err),
        };
        let response = self.handle(&req);
        write_http_response(&mut stream, &response)
    }

    fn route(&self, req: &HttpRequest, segments: &[&str]) -> Result<HttpResponse, ApiError> {
        let body = req.body.as_slice();
        match (req.method.as_str(), segments) {
            ("GET", ["health"]) => Ok(HttpResponse::json(200, json!({"status": "ok"}))),
            ("GET", ["metrics"]) => Ok(HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.render_metrics_text(),
            )),
            ("GET", ["api", "criteria"]) => Ok(Self::criteria_response()),
            ("GET", ["api", "presets"]) => Ok(Self::presets_response()),
            ("GET", ["api", "presets", id]) => Self::preset_response(id),
            ("GET", ["api", "data"]) => Ok(self.list_catalog()),
            ("POST", ["api", "data"]) => self.add_entry(body),
            ("PUT", ["api", "data", no]) => self.update_entry(parse_id(no, "catalog entry")?, body),
            ("DELETE", ["api", "data", no]) => self.delete_entry(parse_id(no, "catalog entry")?),
            ("POST", ["api", "calculate"]) => self.calculate(body),
            ("POST", ["api", "calculate-detail"]) => self.calculate_detail(body),
            ("POST", ["api", "rank"]) => self.rank_generic(body),
            ("POST", ["api", "rank", "batch"]) => self.rank_weight_sets(body),
            ("POST", ["api", "sensitivity"]) => self.sensitivity(body),
            ("GET", ["api", "history"]) => Ok(self.list_history()),
            ("POST", ["api", "history"]) => self.save_history(body),
            ("DELETE", ["api", "history"]) => self.clear_history(),
            ("DELETE", ["api", "history", id]) => self.delete_history(parse_id(id, "history entry")?),
            (method, _) if route_label(segments) != UNMATCHED_ROUTE => {
                Err(ApiError::MethodNotAllowed(method.to_string()))
            }
            _ => Err(ApiError::NotFound(format!("no route for {}", req.path))),
        }
    }

    fn criteria_response() -> HttpResponse {
        let criteria: Vec<CriterionInfo> = VPS_CRITERIA.iter().map(|c| CriterionInfo::from(*c)).collect();
        HttpResponse::json(200, json!({"data": criteria}))
    }

    fn presets_response() -> HttpResponse {
        let views: Vec<PresetView> = presets().iter().map(PresetView::from).collect();
        HttpResponse::json(200, json!({"default": DEFAULT_PRESET_ID, "data": views}))
    }

    fn preset_response(id: &str) -> Result<HttpResponse, ApiError> {
        let found = preset(id).ok_or_else(|| ApiError::NotFound(format!("preset {id:?} not found")))?;
        Ok(HttpResponse::json(200, json!({"data": PresetView::from(found)})))
    }

    fn list_catalog(&self) -> HttpResponse {
        let items: Vec<CatalogItem> = self
            .catalog
            .lock()
            .list()
            .iter()
            .map(CatalogItem::from)
            .collect();
        HttpResponse::json(200, json!({"total": items.len(), "data": items}))
    }

    fn add_entry(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let payload: VendorPayload = parse_body(body)?;
        let entry = self.catalog.lock().add(payload.resolve()?)?;
        Ok(HttpResponse::json(
            201,
            json!({"message": "catalog entry added", "data": CatalogItem::from(&entry)}),
        ))
    }

    fn update_entry(&self, no: u32, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let payload: VendorPayload = parse_body(body)?;
        let updated = self.catalog.lock().update(no, payload.resolve()?)?;
        let entry = updated.ok_or_else(|| ApiError::NotFound(format!("catalog entry {no} not found")))?;
        Ok(HttpResponse::json(
            200,
            json!({"message": "catalog entry updated", "data": CatalogItem::from(&entry)}),
        ))
    }

    fn delete_entry(&self, no: u32) -> Result<HttpResponse, ApiError> {
        if !self.catalog.lock().remove(no)? {
            return Err(ApiError::NotFound(format!("catalog entry {no} not found")));
        }
        Ok(HttpResponse::json(200, json!({"message": "catalog entry deleted"})))
    }

    fn calculate(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let weights: VpsWeights = parse_body(body)?;
        let (entries, ranking) = self.rank_catalog(weights)?;
        let rankings = catalog_rankings(&entries, &ranking);
        let response = CalculateResponse {
            weights,
            top_recommendation: rankings.first().cloned(),
            rankings,
            ideal_positive: ranking.ideal_positive,
            ideal_negative: ranking.ideal_negative,
        };
        Ok(HttpResponse::json(200, json!(response)))
    }

    fn calculate_detail(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let weights: VpsWeights = parse_body(body)?;
        let entries = self.catalog.lock().list();
        let detail = breakdown(&catalog_request(&entries, weights))?;
        self.metrics.lock().record_ranking(entries.len());
        let response = CalculationDetail {
            weights,
            criteria: VPS_CRITERIA.iter().map(|c| CriterionInfo::from(*c)).collect(),
            formulas: FORMULAS,
            vendors: entries.iter().map(CatalogEntry::label).collect(),
            breakdown: detail,
        };
        Ok(HttpResponse::json(200, json!(response)))
    }

    fn rank_generic(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let wire: WireRankRequest = parse_body(body)?;
        let request = wire.into_request();
        let ranking = rank(&request)?;
        self.metrics.lock().record_ranking(request.alternatives.len());
        Ok(HttpResponse::json(200, json!(RankResponse::from(&ranking))))
    }

    fn rank_weight_sets(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let wire: WireBatchRequest = parse_body(body)?;
        if wire.weight_sets.len() > self.max_batch {
            return Err(ApiError::BadRequest(format!(
                "batch of {} weight sets exceeds the limit of {}",
                wire.weight_sets.len(),
                self.max_batch
            )));
        }
        let (alternatives, directions, weight_sets) = wire.into_parts();
        let outcomes = rank_batch(&alternatives, &directions, &weight_sets);

        let mut metrics = self.metrics.lock();
        let results: Vec<BatchItem> = outcomes
            .into_iter()
            .map(|item| match item.outcome {
                Ok(ranking) => {
                    metrics.record_ranking(alternatives.len());
                    BatchItem {
                        weights: item.weights,
                        results: Some(ranking.results.iter().map(RankResult::from).collect()),
                        error: None,
                    }
                }
                Err(err) => BatchItem {
                    weights: item.weights,
                    results: None,
                    error: Some(ErrorBody::from(&err)),
                },
            })
            .collect();
        drop(metrics);

        Ok(HttpResponse::json(200, json!({"results": results})))
    }

    fn sensitivity(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let payload: SensitivityPayload = parse_body(body)?;
        let criterion = VpsCriterion::parse(&payload.criterion).ok_or_else(|| {
            ApiError::BadRequest(format!("unknown criterion {:?}", payload.criterion))
        })?;
        let sweep = SensitivitySweep::new(
            criterion.column(),
            payload.start,
            payload.end,
            payload.step,
        );

        let entries = self.catalog.lock().list();
        let alternatives = catalog_alternatives(&entries);
        let points = run_sweep(&alternatives, &vps_directions(), &sweep)?;

        let views = points
            .iter()
            .map(|point| -> Result<SensitivityPointView, ApiError> {
                let weights = VpsWeights::from_vec(&point.weights)?;
                Ok(SensitivityPointView {
                    weight: weights.get(criterion),
                    weights,
                    rankings: catalog_rankings(&entries, &point.ranking)
                        .into_iter()
                        .take(payload.top)
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut metrics = self.metrics.lock();
        for _ in &views {
            metrics.record_ranking(entries.len());
        }
        drop(metrics);

        let response = SensitivityResponse {
            criterion,
            points: views,
        };
        Ok(HttpResponse::json(200, json!(response)))
    }

    fn list_history(&self) -> HttpResponse {
        let history = self.history.lock();
        HttpResponse::json(
            200,
            json!({"data": history.list(), "stats": history.stats()}),
        )
    }

    fn save_history(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let payload: HistoryPayload = parse_body(body)?;
        let (entries, ranking) = self.rank_catalog(payload.weights)?;
        let rankings = catalog_rankings(&entries, &ranking)
            .into_iter()
            .map(|r| HistoryRanking {
                rank: r.rank,
                vendor: r.vendor,
                plan: r.plan,
                score: r.score,
            })
            .collect();
        let weights = payload.weights;
        let new_entry = NewHistoryEntry {
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            tags: payload.tags.unwrap_or_default(),
            weights: HistoryWeights {
                cpu: weights.cpu,
                ram: weights.ram,
                disk: weights.disk,
                price: weights.price,
            },
            total_alternatives: entries.len(),
            rankings,
        };
        let saved = self.history.lock().record(new_entry)?;
        Ok(HttpResponse::json(
            201,
            json!({"message": "analysis saved", "data": saved}),
        ))
    }

    fn delete_history(&self, id: u64) -> Result<HttpResponse, ApiError> {
        if !self.history.lock().remove(id)? {
            return Err(ApiError::NotFound(format!("history entry {id} not found")));
        }
        Ok(HttpResponse::json(200, json!({"message": "history entry deleted"})))
    }

    fn clear_history(&self) -> Result<HttpResponse, ApiError> {
        let removed = self.history.lock().clear()?;
        Ok(HttpResponse::json(
            200,
            json!({"message": "history cleared", "removed": removed}),
        ))
    }

    /// Ranks the whole catalog; an empty catalog is an invalid matrix.
    fn rank_catalog(&self, weights: VpsWeights) -> Result<(Vec<CatalogEntry>, Ranking), ApiError> {
        let entries = self.catalog.lock().list();
        let ranking = rank(&catalog_request(&entries, weights))?;
        self.metrics.lock().record_ranking(entries.len());
        Ok((entries, ranking))
    }

    fn render_metrics_text(&self) -> String {
        let catalog_entries = self.catalog.lock().list().len();
        let history_entries = self.history.lock().list().len();
        self.metrics.lock().render(catalog_entries, history_entries)
    }
}

fn catalog_alternatives(entries: &[CatalogEntry]) -> Vec<Alternative> {
    entries
        .iter()
        .map(|e| Alternative::new(e.no.to_string(), e.values()))
        .collect()
}

fn catalog_request(entries: &[CatalogEntry], weights: VpsWeights) -> RankRequest {
    RankRequest {
        alternatives: catalog_alternatives(entries),
        weights: weights.to_vec(),
        directions: vps_directions(),
    }
}

/// Joins ranked results back to the catalog rows they were built from.
fn catalog_rankings(entries: &[CatalogEntry], ranking: &Ranking) -> Vec<CatalogRanking> {
    ranking
        .results
        .iter()
        .filter_map(|r| entries.get(r.index).map(|e| CatalogRanking::new(e, r)))
        .collect()
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|_| ApiError::NotFound(format!("{what} {raw:?} not found")))
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn route_label(segments: &[&str]) -> &'static str {
    match segments {
        ["health"] => "/health",
        ["metrics"] => "/metrics",
        ["api", "criteria"] => "/api/criteria",
        ["api", "presets"] => "/api/presets",
        ["api", "presets", _] => "/api/presets/{id}",
        ["api", "data"] => "/api/data",
        ["api", "data", _] => "/api/data/{no}",
        ["api", "calculate"] => "/api/calculate",
        ["api", "calculate-detail"] => "/api/calculate-detail",
        ["api", "rank"] => "/api/rank",
        ["api", "rank", "batch"] => "/api/rank/batch",
        ["api", "sensitivity"] => "/api/sensitivity",
        ["api", "history"] => "/api/history",
        ["api", "history", _] => "/api/history/{id}",
        _ => UNMATCHED_ROUTE,
    }
}
