mod paths;
mod strings;

pub use paths::*;
pub use strings::*;
