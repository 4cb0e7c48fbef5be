use crate::config::AppConfig;
use crate::errors::StudyLinkError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

fn configured_params() -> Result<Params, StudyLinkError> {
    let argon2 = &AppConfig::get().argon2;
    Params::new(argon2.memory_cost, argon2.time_cost, argon2.parallelism, None)
        .map_err(|e| StudyLinkError::validation(format!("Argon2 参数错误: {e}")))
}

/// 哈希密码（argon2id，参数来自配置）
pub fn hash_password(password: &str) -> Result<String, StudyLinkError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, configured_params()?);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StudyLinkError::validation(format!("密码哈希失败: {e}")))
}

/// 验证密码，参数从哈希串中读取
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// 哈希不是 argon2id 或参数与当前配置不同，登录成功后应重新哈希
pub fn needs_rehash(hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return true;
    };
    if parsed.algorithm != Algorithm::Argon2id.ident() {
        return true;
    }
    match (Params::try_from(&parsed), configured_params()) {
        (Ok(stored), Ok(current)) => {
            stored.m_cost() != current.m_cost()
                || stored.t_cost() != current.t_cost()
                || stored.p_cost() != current.p_cost()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[test]
    fn test_needs_rehash() {
        let hash = hash_password("secret1").unwrap();
        assert!(!needs_rehash(&hash));

        // 旧参数（t=1）生成的哈希需要升级
        let old = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(8 * 1024, 1, 1, None).unwrap(),
        )
        .hash_password(b"secret1", &SaltString::generate(&mut OsRng))
        .unwrap()
        .to_string();
        let current = &AppConfig::get().argon2;
        assert_eq!(
            needs_rehash(&old),
            (current.memory_cost, current.time_cost, current.parallelism) != (8 * 1024, 1, 1)
        );
        assert!(needs_rehash("plain-text"));
    }
}
