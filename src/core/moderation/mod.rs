// Core moderation module - the two-stage phishing pipeline.
// Screener and classifier are independent; the service wires them together.

pub mod classifier;
pub mod moderation_models;
pub mod moderation_service;
pub mod notices;
pub mod screener;
pub mod screening_rules;

pub use classifier::RemoteClassifier;
pub use moderation_models::*;
pub use moderation_service::*;
pub use screener::HeuristicScreener;
pub use screening_rules::ScreeningRules;
