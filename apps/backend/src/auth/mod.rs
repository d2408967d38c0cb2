pub mod claims;
pub mod token;

pub use claims::{Claims, Role};
pub use token::{IssuedToken, TokenCodec, Verification};
