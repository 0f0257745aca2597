//! Token signing and password hashing

pub mod jwt;
pub mod password;

pub use jwt::{create_token, decode_token, JwtConfig, TokenClaims};
pub use password::{hash_password, hash_password_with_cost, is_bcrypt_hash, verify_password};
