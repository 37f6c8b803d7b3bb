// Narrow interfaces the pipeline core consumes; adapters live in `infra`
pub mod ports;
