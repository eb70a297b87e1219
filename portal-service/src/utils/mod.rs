mod secret;
mod validation;

pub use secret::{
    digest_invite_token, generate_access_id, generate_access_key, generate_access_token,
    hash_secret, normalize_secret, verify_secret, ACCESS_ID_PREFIX,
};
pub use validation::ValidatedJson;
