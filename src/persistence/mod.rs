pub mod codec;
pub mod handler;

pub use codec::{decode_metadata, encode_metadata};
pub use handler::PersistenceHandler;
