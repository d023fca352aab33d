pub mod types;
pub mod token;
pub mod loader;
pub mod validator;

pub use types::*;
pub use token::*;
pub use loader::*;
pub use validator::*;
