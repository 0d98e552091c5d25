//! Orders: the draft/record model, input binding, validation and persistence.

pub mod binding;
pub mod model;
pub mod submitter;
pub mod validator;

pub use binding::*;
pub use model::*;
pub use submitter::*;
pub use validator::*;
