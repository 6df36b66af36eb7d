pub mod error;
pub mod instructions;
pub mod timeout;
pub mod traits;
pub mod types;

pub use error::ReframeError;
pub use instructions::{InstructionsSnapshot, PersonaInstructions};
pub use timeout::with_timeout;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, ReplySink, SearchProvider};
pub use types::{ConversationTurn, SearchHit, Speaker};
