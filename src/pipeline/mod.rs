pub mod extraction;
pub mod classify;
pub mod structuring;
pub mod processor; // Upload orchestrator: save → preprocess → recognize → analyze → store
