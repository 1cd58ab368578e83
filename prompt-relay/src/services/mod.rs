pub mod gemini;
pub mod relay;
pub mod upstream;

pub use gemini::GeminiClient;
pub use relay::PromptRelay;
pub use upstream::{HttpTransport, MockTransport, UpstreamResponse, UpstreamTransport};
