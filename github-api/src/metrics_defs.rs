use shared::metrics_defs::{MetricDef, MetricType};

pub const TOKEN_ROTATIONS: MetricDef = MetricDef {
    name: "github.token_rotations",
    metric_type: MetricType::Counter,
    description: "Upstream calls that failed over to the next configured token",
};

pub const RETRY_EXHAUSTIONS: MetricDef = MetricDef {
    name: "github.retry_exhaustions",
    metric_type: MetricType::Counter,
    description: "Logical calls abandoned after every configured token was rate limited",
};

pub const ALL_METRICS: &[MetricDef] = &[TOKEN_ROTATIONS, RETRY_EXHAUSTIONS];
