pub mod adapter;

pub use adapter::TranscriptionAdapter;
#[cfg(any(test, feature = "test-util"))]
pub use adapter::MockTranscriptionAdapter;
