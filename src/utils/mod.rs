pub mod cookie;
pub mod jwt;
pub mod password;

pub use jwt::{decode_session_token, encode_session_token, hash_session_id};
pub use password::{hash_password, verify_password};
