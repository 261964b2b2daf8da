//! AI responder adapters
//!
//! - [`ScriptedResponder`]: offline, deterministic replies
//! - `OpenAiCompatibleResponder`: streaming chat completions over HTTP
//!   (requires the `http-responder` feature)

mod scripted;

#[cfg(feature = "http-responder")]
mod openai;

pub use scripted::ScriptedResponder;

#[cfg(feature = "http-responder")]
pub use openai::OpenAiCompatibleResponder;
