pub mod engine;
pub mod loop_control;
pub mod selector;
pub mod state;
