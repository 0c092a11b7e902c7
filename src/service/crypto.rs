use constant_time_eq::constant_time_eq;
use sha3::{Digest, Sha3_256};
use uuid::Uuid;

pub fn get_sha3_256_hash(data: &str) -> String {
   let mut hasher = Sha3_256::default();
   hasher.update(data);
   format!("{:X}", hasher.finalize())
}

/// Constant-time comparison of the SHA3 digests of both passwords.
pub fn passwords_match(candidate: &str, expected: &str) -> bool {
   let candidate = get_sha3_256_hash(candidate);
   let expected = get_sha3_256_hash(expected);
   constant_time_eq(candidate.as_bytes(), expected.as_bytes())
}

/// 128 random bits, URL safe.
pub fn generate_token() -> String {
   Uuid::new_v4().simple().to_string()
}
