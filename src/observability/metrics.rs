//! Metric recording helpers.
//!
//! Counters go through the `metrics` facade. Nothing is exported unless the
//! binary installs a recorder, in which case these names follow the Prometheus
//! conventions.

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ElevationLookupsSuccess,
    ElevationLookupsError,
    ValidationValid,
    ValidationInvalid,
    UploadSuccess,
    UploadError,
    StageCompleted,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ElevationLookupsSuccess => "osm_elevation_lookups_success_total",
            MetricName::ElevationLookupsError => "osm_elevation_lookups_error_total",
            MetricName::ValidationValid => "osm_elevation_validation_valid_total",
            MetricName::ValidationInvalid => "osm_elevation_validation_invalid_total",
            MetricName::UploadSuccess => "osm_elevation_upload_success_total",
            MetricName::UploadError => "osm_elevation_upload_error_total",
            MetricName::StageCompleted => "osm_elevation_stage_completed_total",
        }
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn lookup_succeeded(provider: &str) {
        let metric_name = MetricName::ElevationLookupsSuccess.as_str();
        ::metrics::counter!(metric_name, "provider" => provider.to_string()).increment(1);
    }

    pub fn lookup_failed(provider: &str) {
        let metric_name = MetricName::ElevationLookupsError.as_str();
        ::metrics::counter!(metric_name, "provider" => provider.to_string()).increment(1);
    }
}

pub mod validate {
    use super::MetricName;

    pub fn element_classified(category: &str, valid: bool) {
        let metric_name = if valid {
            MetricName::ValidationValid.as_str()
        } else {
            MetricName::ValidationInvalid.as_str()
        };
        ::metrics::counter!(metric_name, "category" => category.to_string()).increment(1);
    }
}

pub mod upload {
    use super::MetricName;

    pub fn element_processed(success: bool, dry_run: bool) {
        let metric_name = if success {
            MetricName::UploadSuccess.as_str()
        } else {
            MetricName::UploadError.as_str()
        };
        let mode = if dry_run { "dry_run" } else { "live" };
        ::metrics::counter!(metric_name, "mode" => mode).increment(1);
    }
}

pub mod stage {
    use super::MetricName;

    pub fn completed(stage: &'static str) {
        let metric_name = MetricName::StageCompleted.as_str();
        ::metrics::counter!(metric_name, "stage" => stage).increment(1);
    }
}
