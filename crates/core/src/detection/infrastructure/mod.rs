pub mod fallback_detection_provider;
pub mod recorded_detection_provider;
