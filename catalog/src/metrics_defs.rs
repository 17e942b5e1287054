//! Metrics definitions for the catalog service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const DB_LOOKUP_DURATION: MetricDef = MetricDef {
    name: "catalog.db.lookup.duration",
    metric_type: MetricType::Histogram,
    description: "Time to look up a product row in seconds",
};

pub const DB_LOOKUP_MISS: MetricDef = MetricDef {
    name: "catalog.db.lookup.miss",
    metric_type: MetricType::Counter,
    description: "Number of lookups for a product id with no row",
};

pub const EXTERNAL_FETCH_DURATION: MetricDef = MetricDef {
    name: "catalog.external.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch a product from the external product service in seconds",
};

pub const EXTERNAL_FETCH_ERROR: MetricDef = MetricDef {
    name: "catalog.external.fetch.error",
    metric_type: MetricType::Counter,
    description: "Number of external fetches answered with the error sentinel",
};

pub const ALL_METRICS: &[MetricDef] = &[
    DB_LOOKUP_DURATION,
    DB_LOOKUP_MISS,
    EXTERNAL_FETCH_DURATION,
    EXTERNAL_FETCH_ERROR,
];
