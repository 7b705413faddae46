//! Metric Records Module
//!
//! Accumulators for request, query and cache-operation timings, and the
//! plain records they are projected into for reporting.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::time::round2;

// == Duration Accumulator ==
/// Count, total, min and max of a stream of durations.
#[derive(Debug, Clone)]
pub(crate) struct Timing {
    pub count: u64,
    pub total: f64,
    /// f64::INFINITY until the first observation
    pub min: f64,
    pub max: f64,
    pub last_access: u64,
}

impl Timing {
    pub fn new() -> Self {
        Self {
            count: 0,
            total: 0.0,
            min: f64::INFINITY,
            max: 0.0,
            last_access: 0,
        }
    }

    pub fn observe(&mut self, duration_ms: f64, now_ms: u64) {
        self.count += 1;
        self.total += duration_ms;
        self.min = self.min.min(duration_ms);
        self.max = self.max.max(duration_ms);
        self.last_access = self.last_access.max(now_ms);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }

    /// Minimum for display; the unset sentinel reads as 0.
    pub fn display_min(&self) -> f64 {
        if self.min.is_finite() {
            round2(self.min)
        } else {
            0.0
        }
    }
}

// == Request Metric ==
#[derive(Debug, Clone)]
pub(crate) struct RequestMetric {
    pub method: String,
    pub path: String,
    pub timing: Timing,
    pub status_codes: BTreeMap<u16, u64>,
}

impl RequestMetric {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            timing: Timing::new(),
            status_codes: BTreeMap::new(),
        }
    }

    pub fn observe(&mut self, duration_ms: f64, status_code: u16, now_ms: u64) {
        self.timing.observe(duration_ms, now_ms);
        *self.status_codes.entry(status_code).or_insert(0) += 1;
    }

    pub fn to_stats(&self, endpoint: &str) -> RequestStats {
        RequestStats {
            endpoint: endpoint.to_string(),
            method: self.method.clone(),
            path: self.path.clone(),
            count: self.timing.count,
            avg_duration: round2(self.timing.avg()),
            min_duration: self.timing.display_min(),
            max_duration: round2(self.timing.max),
            total_duration: round2(self.timing.total),
            status_codes: self.status_codes.clone(),
            last_access: self.timing.last_access,
        }
    }
}

/// Per-endpoint request summary.
#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    /// `METHOD:path`
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub count: u64,
    pub avg_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub total_duration: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub last_access: u64,
}

// == Query Kind ==
/// Statement verb a query is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Other,
}

impl QueryKind {
    /// Classifies a query by its leading keyword, ignoring case and surrounding whitespace.
    pub fn classify(query: &str) -> Self {
        let verb = query
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        match verb.as_str() {
            "SELECT" => QueryKind::Select,
            "INSERT" => QueryKind::Insert,
            "UPDATE" => QueryKind::Update,
            "DELETE" => QueryKind::Delete,
            "CREATE" => QueryKind::Create,
            "DROP" => QueryKind::Drop,
            "ALTER" => QueryKind::Alter,
            _ => QueryKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
            QueryKind::Create => "CREATE",
            QueryKind::Drop => "DROP",
            QueryKind::Alter => "ALTER",
            QueryKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Query Metric ==
#[derive(Debug, Clone)]
pub(crate) struct QueryMetric {
    pub timing: Timing,
    pub total_rows: u64,
}

impl QueryMetric {
    pub fn new() -> Self {
        Self {
            timing: Timing::new(),
            total_rows: 0,
        }
    }

    pub fn observe(&mut self, duration_ms: f64, row_count: u64, now_ms: u64) {
        self.timing.observe(duration_ms, now_ms);
        self.total_rows += row_count;
    }

    pub fn avg_rows(&self) -> f64 {
        if self.timing.count == 0 {
            0.0
        } else {
            self.total_rows as f64 / self.timing.count as f64
        }
    }

    pub fn to_stats(&self, kind: QueryKind) -> QueryStats {
        QueryStats {
            query_type: kind.as_str().to_string(),
            count: self.timing.count,
            avg_duration: round2(self.timing.avg()),
            min_duration: self.timing.display_min(),
            max_duration: round2(self.timing.max),
            total_duration: round2(self.timing.total),
            total_rows: self.total_rows,
            avg_rows: round2(self.avg_rows()),
            last_access: self.timing.last_access,
        }
    }
}

/// Per-verb query summary.
#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub query_type: String,
    pub count: u64,
    pub avg_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub total_duration: f64,
    pub total_rows: u64,
    pub avg_rows: f64,
    pub last_access: u64,
}

// == Cache Operation Metric ==
#[derive(Debug, Clone)]
pub(crate) struct CacheOpMetric {
    pub timing: Timing,
    pub hits: u64,
    pub misses: u64,
}

impl CacheOpMetric {
    pub fn new() -> Self {
        Self {
            timing: Timing::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn observe(&mut self, is_get: bool, hit: bool, duration_ms: f64, now_ms: u64) {
        self.timing.observe(duration_ms, now_ms);
        if is_get {
            if hit {
                self.hits += 1;
            } else {
                self.misses += 1;
            }
        }
    }

    /// hits / (hits + misses), 0 before any get.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn to_stats(&self, operation: &str) -> CacheOpStats {
        CacheOpStats {
            operation: operation.to_string(),
            count: self.timing.count,
            hits: self.hits,
            misses: self.misses,
            hit_rate: round2(self.hit_rate()),
            total_duration: round2(self.timing.total),
            avg_duration: round2(self.timing.avg()),
            last_access: self.timing.last_access,
        }
    }
}

/// Per-operation cache summary.
#[derive(Debug, Clone, Serialize)]
pub struct CacheOpStats {
    /// `cache:<operation>`
    pub operation: String,
    pub count: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub total_duration: f64,
    pub avg_duration: f64,
    pub last_access: u64,
}
