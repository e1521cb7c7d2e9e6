//! Token accounting: usage records, pricing and raw-output parsing.

mod model;
pub mod parser;
pub mod pricing;

pub use model::TokenUsage;
pub use parser::{AGGREGATE_INPUT_PERCENT, ParsedTokens, parse_tokens_from_raw_output};
pub use pricing::{DEFAULT_MODEL, ModelPricing, PricingTable};
