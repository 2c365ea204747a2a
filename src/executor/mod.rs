pub mod alert;
pub mod input;
pub mod keys;
pub mod text_input;
