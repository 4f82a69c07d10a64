pub mod codec;
pub mod ec;
pub mod mask;
pub mod metadata;
pub mod utils;

pub use mask::*;
pub use metadata::*;
