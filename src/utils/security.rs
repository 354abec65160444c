use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

// Hash PHC con sal aleatoria; nunca guardamos la contraseña en claro
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Error al encriptar contraseña: {e}")))
}

// Comparación en tiempo constante; un hash corrupto cuenta como no válido
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password("secreto123").unwrap();
        let b = hash_password("secreto123").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("secreto123"));
        assert!(verify_password("secreto123", &a));
        assert!(!verify_password("otra-cosa", &a));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("secreto123", "no-es-un-hash"));
    }
}
