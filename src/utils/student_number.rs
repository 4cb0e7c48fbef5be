//! 学号生成与规范化

use rand::Rng;

pub const STUDENT_NUMBER_LEN: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 生成 8 位学号（A-Z0-9），唯一性由调用方重试保证
pub fn generate_student_number() -> String {
    let mut rng = rand::rng();
    (0..STUDENT_NUMBER_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// 去除空白并转为大写；长度或字符不合法时返回 None
pub fn normalize_student_number(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_ascii_uppercase();
    let valid = normalized.len() == STUDENT_NUMBER_LEN
        && normalized
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    valid.then_some(normalized)
}
