//! Multi-face identification and attendance engine.
//!
//! Fuses detection passes, assigns detections to gallery identities one to
//! one, and stabilizes per-frame matches into attendance verdicts over a
//! sliding window of frames.

pub mod shared {
    pub mod bounding_box;
    pub mod config;
    pub mod constants;
    pub mod embedding;
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod detection_filter;
        pub mod detection_fusion;
        pub mod detection_provider;
        pub mod face_landmarks;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod gallery;
        pub mod identity_matcher;
        pub mod match_result;
        pub mod similarity_threshold;
    }
    pub mod infrastructure;
}

pub mod attendance {
    pub mod domain {
        pub mod attendance_report;
        pub mod temporal_aggregator;
    }
}

pub mod pipeline {
    pub mod infrastructure;
    pub mod pipeline_logger;
    pub mod process_frame_use_case;
}
