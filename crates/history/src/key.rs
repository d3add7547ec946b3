//! 프로젝트 키 변환 — 프로젝트 이름을 안전한 파일 이름으로 변환

/// 프로젝트 이름을 파일 시스템에서 안전한 히스토리 키로 변환합니다.
///
/// 영숫자, `-`, `_`만 유지하고 나머지 문자는 `_`로 치환합니다.
/// 빈 이름이나 공백뿐인 이름은 `"unnamed-project"`로 대체됩니다.
///
/// 서로 다른 이름이 같은 키로 변환될 수 있으며, 그 경우 같은
/// 히스토리 파일을 공유합니다 (예: `a/b`와 `a.b`는 모두 `a_b`).
pub fn project_key(project_name: &str) -> String {
    let trimmed = project_name.trim();
    if trimmed.is_empty() {
        return "unnamed-project".to_owned();
    }
    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
