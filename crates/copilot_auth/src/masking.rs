const VISIBLE_PREFIX: usize = 4;

/// Mask a secret for log output, keeping a short prefix so values can be told apart.
pub fn mask_secret(secret: &str) -> String {
    let char_count = secret.chars().count();
    if char_count <= VISIBLE_PREFIX * 2 {
        return "[MASKED]".to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE_PREFIX).collect();
    format!("{prefix}...[MASKED]")
}
