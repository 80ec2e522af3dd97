pub mod completion;
pub mod sessions;
pub mod word_progress;

pub use word_progress::ProgressError;
