use bcrypt::{hash, verify, DEFAULT_COST};
use driveconnect_common::AppError;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
        if password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }
        Ok(())
    }

    /// Burn a hash on the unknown-email login path so response timing does
    /// not reveal whether an account exists.
    pub fn dummy_verify() {
        let _ = hash("dummy", DEFAULT_COST);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = PasswordService::hash_password("correct horse").unwrap();
        assert!(PasswordService::verify_password("correct horse", &hashed).unwrap());
        assert!(!PasswordService::verify_password("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(PasswordService::validate_password_strength("abc12").is_err());
        assert!(PasswordService::validate_password_strength("abc123").is_ok());
    }
}
