use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub fn init_logging(max_level: &str) {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(max_level));
}

#[derive(Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Mapping from percentile label (e.g., "p90", "p99") to value.
    pub percentiles: BTreeMap<String, f64>,
}

impl HistogramStats {
    /// Compute histogram statistics and selected percentiles from a slice of raw values.
    pub fn compute(samples: &[ordered_float::OrderedFloat<f64>]) -> Self {
        let len = samples.len();
        if len == 0 {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                percentiles: BTreeMap::new(),
            };
        }

        let mut values: Vec<f64> = samples.iter().map(|v| v.into_inner()).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mean = values.iter().sum::<f64>() / len as f64;

        let percentile = |pct: f64| -> f64 {
            let idx = ((pct / 100.0) * (len as f64 - 1.0)).round() as usize;
            values[idx]
        };

        const PCTS: &[(f64, &str)] = &[
            (10.0, "p10"),
            (50.0, "p50"),
            (90.0, "p90"),
            (99.0, "p99"),
        ];
        let percentiles = PCTS
            .iter()
            .map(|(pct, label)| ((*label).to_string(), percentile(*pct)))
            .collect();

        Self {
            count: len,
            min: values[0],
            max: values[len - 1],
            mean,
            percentiles,
        }
    }
}

#[derive(Serialize)]
pub struct MetricDump {
    pub name: String,
    /// For counters and gauges, holds the raw numeric value. `None` for histograms.
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<HistogramStats>,
}

/// Collects everything recorded through the `metrics` macros in this process.
pub struct MetricsRecorder {
    snapshotter: Snapshotter,
}

impl MetricsRecorder {
    /// Installs a debugging recorder as the global `metrics` recorder.
    pub fn new() -> anyhow::Result<Self> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .map_err(|_| anyhow::anyhow!("a global metrics recorder is already installed"))?;
        Ok(Self { snapshotter })
    }

    pub fn snapshot_metrics(&self) -> HashMap<String, MetricDump> {
        self.snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(ckey, _unit, _description, value)| {
                let name = ckey.key().name().to_owned();
                let dump = match value {
                    DebugValue::Counter(v) => MetricDump {
                        name: name.clone(),
                        value: Some(v as f64),
                        histogram: None,
                    },
                    DebugValue::Gauge(v) => MetricDump {
                        name: name.clone(),
                        value: Some(v.into_inner()),
                        histogram: None,
                    },
                    DebugValue::Histogram(samples) => MetricDump {
                        name: name.clone(),
                        value: None,
                        histogram: Some(HistogramStats::compute(&samples)),
                    },
                };
                (name, dump)
            })
            .collect()
    }
}
