use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS_ROUTED: MetricDef = MetricDef {
    name: "gateway.requests_routed",
    metric_type: MetricType::Counter,
    description: "Requests dispatched to a card handler",
};

pub const REQUESTS_UNROUTED: MetricDef = MetricDef {
    name: "gateway.requests_unrouted",
    metric_type: MetricType::Counter,
    description: "Requests that matched no route and returned 404",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS_ROUTED, REQUESTS_UNROUTED];
