pub mod detector;
pub mod screenshot;
pub mod template;
pub mod traits;
pub mod types;
