pub mod types;
pub mod cipher;
pub mod keygen;

pub use types::*;
pub use cipher::{decrypt, encrypt};
pub use keygen::generate_key;
