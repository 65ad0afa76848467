pub mod clock;
pub mod error;
pub mod feed;
pub mod traits;
pub mod types;
pub mod window;

pub use clock::*;
pub use error::*;
pub use feed::*;
pub use traits::*;
pub use types::*;
pub use window::*;
