pub mod providers;
pub mod resilient;
pub mod retry;

pub use providers::mock::{MockProvider, MockReply};
pub use providers::openai::OpenAiProvider;
pub use resilient::ResilientProvider;
pub use retry::{retry_async, RetryPolicy};
