//! Canned prompt library and the policy deciding which AI answers a picked prompt.

mod library;

pub use library::{PromptCategory, PromptLibrary, ProviderAssignment};
