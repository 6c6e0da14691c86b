//! Model clients

mod base;
mod openai;

pub use base::{Auth, HttpClientBase};
pub use openai::OpenAIClient;
