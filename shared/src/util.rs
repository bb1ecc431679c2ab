/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize a catalog name for case-insensitive comparison.
///
/// Folds ASCII letters only, the same rule SQLite's `NOCASE` collation
/// applies to the stored catalog. Whitespace is kept.
pub fn fold_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("Patients"), "patients");
        assert_eq!(fold_name("VIEW"), "view");
        assert_ne!(fold_name("Patients "), fold_name("Patients"));
    }

    #[test]
    fn test_fold_name_leaves_non_ascii_alone() {
        assert_eq!(fold_name("ÄRZTE"), "Ärzte");
        assert_ne!(fold_name("ÄRZTE"), fold_name("ärzte"));
    }
}
