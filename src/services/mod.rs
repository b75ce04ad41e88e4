// Humanizer Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod detection;
pub mod humanizer;

pub use text_processor::*;
pub use config_store::*;
pub use providers::*;

pub use detection::{
    analyze_insights,
    analyze_text,
    compare_detections,
    detect,
    detect_with,
    score_insights,
};
pub use humanizer::{Humanizer, HumanizerError};
