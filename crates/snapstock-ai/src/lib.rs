//! AI response normalization for the scan pipeline.
//!
//! Two request modes against one generative capability:
//! - image → structured product ([`ScanAnalyzer::analyze_image`]), with the
//!   never-reject fallback policy;
//! - free text → variant option set ([`ScanAnalyzer::parse_variant_text`]),
//!   deterministic parse preferred over the model.

pub mod client;
pub mod error;
pub mod ocr;
pub mod prompts;
pub mod scan;
pub mod variants;

pub use client::{GenPart, GenerativeClient};
pub use error::AiError;
pub use ocr::VisionOcrClient;
pub use scan::{
    fallback_product, repair_scan_fields, strip_data_url, ScanAnalyzer, ScanOptions,
    ANALYZE_TIMEOUT, DESCRIBE_TIMEOUT,
};
pub use variants::{normalize_loose_options, parse_deterministic};
