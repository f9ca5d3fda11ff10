//! コンテンツネゴシエーション
//!
//! リクエストヘッダーとレスポンスの性質から、どの変換を適用するか決める。
//! HTTP フレームワークそのものには依存せず、ヘッダー値の文字列だけを受け取る。

use suspense_wire::{STREAM_CONTENT_TYPE, TRANSITION_HEADER, TRANSITION_HEADER_VALUE};

/// レスポンスに適用する変換の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// 変換しない（非 HTML、またはビルド時レンダリング）
    Bypass,
    /// text/html のまま末尾に chunk を追記する
    Inline,
    /// line-delimited ストリーム（streaming navigation 用）
    JsonLines,
}

/// 適用する変換を決定する
///
/// # 引数
/// - `is_prerender`: ビルド時（静的）レンダリングか。true なら常に素通し
/// - `content_type`: レスポンスの content-type ヘッダー値
/// - `transition_header`: リクエストの `astro-suspense-transition` ヘッダー値
pub fn negotiate(
    is_prerender: bool,
    content_type: Option<&str>,
    transition_header: Option<&str>,
) -> ResponseMode {
    if is_prerender {
        return ResponseMode::Bypass;
    }

    // charset などのパラメータは判定に使わない
    let essence = content_type.map(|c| c.split(';').next().unwrap_or("").trim());
    if essence != Some("text/html") {
        return ResponseMode::Bypass;
    }

    if transition_header == Some(TRANSITION_HEADER_VALUE) {
        ResponseMode::JsonLines
    } else {
        ResponseMode::Inline
    }
}

/// 変換後のレスポンスに設定すべき content-type
///
/// # 戻り値
/// - `Some(..)`: 上書きする値（JsonLines のみ）
/// - `None`: 元の content-type のまま
pub fn response_content_type(mode: ResponseMode) -> Option<&'static str> {
    match mode {
        ResponseMode::JsonLines => Some(STREAM_CONTENT_TYPE),
        _ => None,
    }
}

/// `vary` ヘッダーにネゴシエーションヘッダーを追加した値を返す
///
/// ヘッダー次第でレスポンスが変わるため、キャッシュ層に向けて
/// `astro-suspense-transition` を必ず含める。既に含まれていれば足さない。
pub fn vary_with_transition(existing: Option<&str>) -> String {
    let existing = existing.unwrap_or("").trim();
    if existing.is_empty() {
        return TRANSITION_HEADER.to_string();
    }

    let already = existing
        .split(',')
        .any(|token| token.trim().eq_ignore_ascii_case(TRANSITION_HEADER));
    if already {
        existing.to_string()
    } else {
        format!("{}, {}", existing, TRANSITION_HEADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerender_always_bypasses() {
        let mode = negotiate(true, Some("text/html"), Some("1"));
        assert_eq!(mode, ResponseMode::Bypass);
    }

    #[test]
    fn test_non_html_bypasses() {
        assert_eq!(negotiate(false, Some("audio/mp3"), Some("1")), ResponseMode::Bypass);
        assert_eq!(negotiate(false, None, None), ResponseMode::Bypass);
    }

    #[test]
    fn test_html_without_header_appends_inline() {
        assert_eq!(negotiate(false, Some("text/html"), None), ResponseMode::Inline);
        // charset パラメータは無視される
        assert_eq!(
            negotiate(false, Some("text/html; charset=utf-8"), None),
            ResponseMode::Inline
        );
    }

    #[test]
    fn test_transition_header_selects_json_lines() {
        let mode = negotiate(false, Some("text/html"), Some("1"));
        assert_eq!(mode, ResponseMode::JsonLines);
        assert_eq!(response_content_type(mode), Some(STREAM_CONTENT_TYPE));
    }

    #[test]
    fn test_unknown_header_value_is_not_streaming() {
        assert_eq!(negotiate(false, Some("text/html"), Some("yes")), ResponseMode::Inline);
    }

    #[test]
    fn test_vary_includes_negotiation_header() {
        assert_eq!(vary_with_transition(None), TRANSITION_HEADER);
        assert_eq!(
            vary_with_transition(Some("accept-encoding")),
            format!("accept-encoding, {}", TRANSITION_HEADER)
        );
        // 既に含まれていれば二重に足さない
        assert_eq!(
            vary_with_transition(Some(TRANSITION_HEADER)),
            TRANSITION_HEADER
        );
    }
}
