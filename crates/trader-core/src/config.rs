//! 설정 헬퍼.
//!
//! 이 모듈은 로깅 설정 섹션과 숫자 설정 값 파싱 헬퍼를 제공합니다.
//! 숫자 리스크 파라미터는 관대하게 파싱되며, 잘못된 값은 경고 후
//! 문서화된 기본값으로 대체됩니다 (기동을 중단시키지 않음).

use serde::{Deserialize, Serialize};

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// 숫자 문자열 파싱 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LenientParse {
    /// 값이 비어 있음 (기본값 사용)
    Empty,
    /// 정상 파싱됨
    Value(f64),
    /// 파싱 불가 (경고 후 기본값 사용)
    Invalid,
}

/// 사용자가 입력한 숫자 문자열을 관대하게 파싱합니다.
///
/// 앞뒤 공백과 `%`, `$` 기호를 제거한 뒤 파싱합니다.
/// 예: `" 2.5% "` → `2.5`, `"$10,000"`은 쉼표 때문에 `Invalid`.
pub fn parse_lenient_f64(raw: &str) -> LenientParse {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '%' && *c != '$')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return LenientParse::Empty;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => LenientParse::Value(v),
        _ => LenientParse::Invalid,
    }
}

/// 원시 문자열을 관대하게 파싱하고, 없거나 잘못되면 기본값을 반환합니다.
///
/// 잘못된 값은 `key`와 함께 경고 로그를 남깁니다.
pub fn lenient_f64(key: &str, raw: Option<&str>, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };

    match parse_lenient_f64(raw) {
        LenientParse::Value(v) => v,
        LenientParse::Empty => default,
        LenientParse::Invalid => {
            tracing::warn!(
                key = key,
                value = %raw,
                default = default,
                "잘못된 설정 값, 기본값을 사용합니다"
            );
            default
        }
    }
}
