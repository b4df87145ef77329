pub mod password;
pub mod validation;

pub use password::{
    hash_password, password_strength_error, verify_password, Password, PasswordHashString,
};
pub use validation::ValidatedJson;
