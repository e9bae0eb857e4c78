// Library interface for logdigest modules
// This allows tests and the binary to import modules

pub mod aggregate;
pub mod dates;
pub mod discovery;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod timeframe;
