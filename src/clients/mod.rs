pub mod openai;
pub mod traits;

pub use openai::OpenAIClient;
pub use traits::{CompletionRequest, CompletionResponse, ModelClient, ModelError};
