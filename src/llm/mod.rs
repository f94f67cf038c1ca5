pub mod client;
pub mod prompts;

pub use client::{AnswerGenerator, AnswerRequest, AnswerSource, LLMProvider};
