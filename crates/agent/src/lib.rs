//! Agent runtime - natural-language command resolution and execution
//!
//! This crate is the "brain" of the kirana system:
//! - Resolves free-form English/Hindi/Hinglish text into catalogue actions
//!   (`resolver`), with a rule-based fallback when the language model is
//!   unavailable or returns something unparseable (`fallback`)
//! - Carries conversational context across commands per conversation
//!   (`context`)
//! - Gates destructive actions behind single-use confirmation tokens
//!   (`confirm`)
//! - Dispatches typed actions to the store collaborators and the billing
//!   engine (`executor`)
//! - Orchestrates the whole pipeline per inbound command (`runtime`)
//!
//! # Safety Principle
//!
//! The language model is strictly a translator. It never decides prices,
//! stock, or policy outcomes; those are deterministic decisions made by the
//! billing engine and the store layer.

pub mod confirm;
pub mod context;
pub mod executor;
pub mod fallback;
pub mod llm;
pub mod resolver;
pub mod runtime;

pub use confirm::PendingConfirmationStore;
pub use context::ContextStore;
pub use executor::ActionExecutor;
pub use fallback::PatternResolver;
pub use llm::LlmClient;
pub use resolver::{IntentResolver, Resolution};
pub use runtime::AgentRuntime;
