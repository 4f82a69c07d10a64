pub mod bitstream;
pub mod cast;
pub mod error;
pub mod iter;

pub use bitstream::*;
pub use cast::*;
pub use error::*;
pub use iter::*;
