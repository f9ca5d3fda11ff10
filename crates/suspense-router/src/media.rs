//! レスポンスの分類と遷移先の機能ゲート

use suspense_wire::STREAM_CONTENT_TYPE;

/// fetch したレスポンスのうち、ルーターが扱える種別
///
/// ここに該当しないもの（例: audio/mp3）はブラウザに任せる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchedKind {
    Html,
    Xhtml,
    /// line-delimited ストリーム（シェル + chunk 列）
    SuspenseStream,
}

impl FetchedKind {
    /// DOMParser に渡す mediaType
    ///
    /// ストリームの 1 行目（シェル）は通常の HTML としてパースする。
    pub fn parse_as(&self) -> &'static str {
        match self {
            FetchedKind::Html | FetchedKind::SuspenseStream => "text/html",
            FetchedKind::Xhtml => "application/xhtml+xml",
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, FetchedKind::SuspenseStream)
    }
}

/// content-type ヘッダーからレスポンス種別を分類する
///
/// charset などの name/value パラメータは落としてから比較する
/// （DOMParser は mediaType しか受け付けない）。
///
/// # 戻り値
/// - `Some(kind)`: ルーターが扱える
/// - `None`: 扱えない → フルリロードに縮退
pub fn classify_media_type(content_type: Option<&str>) -> Option<FetchedKind> {
    let essence = content_type?.split(';').next()?.trim();
    match essence {
        "text/html" => Some(FetchedKind::Html),
        "application/xhtml+xml" => Some(FetchedKind::Xhtml),
        s if s == STREAM_CONTENT_TYPE => Some(FetchedKind::SuspenseStream),
        _ => None,
    }
}

/// 遷移先ドキュメントの機能ゲート
///
/// 遷移先が transition 機能を宣言していなければ soft swap しない。
/// ただしフォーム送信は再送を避けるため例外的に続行する。
///
/// # 戻り値
/// - `true`: soft transition を続行してよい
/// - `false`: フルリロードへ
pub fn destination_supports_transition(enabled_marker_present: bool, is_form: bool) -> bool {
    enabled_marker_present || is_form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_variants() {
        assert_eq!(classify_media_type(Some("text/html")), Some(FetchedKind::Html));
        assert_eq!(
            classify_media_type(Some("text/html; charset=utf-8")),
            Some(FetchedKind::Html)
        );
        assert_eq!(
            classify_media_type(Some("application/xhtml+xml")),
            Some(FetchedKind::Xhtml)
        );
    }

    #[test]
    fn test_suspense_stream_content_type() {
        let kind = classify_media_type(Some("text/astro-suspense-transition-stream")).unwrap();
        assert!(kind.is_stream());
        assert_eq!(kind.parse_as(), "text/html");
    }

    #[test]
    fn test_everything_else_is_not_ours() {
        assert_eq!(classify_media_type(Some("audio/mp3")), None);
        assert_eq!(classify_media_type(Some("application/json")), None);
        assert_eq!(classify_media_type(None), None);
    }

    #[test]
    fn test_destination_gate() {
        assert!(destination_supports_transition(true, false));
        assert!(!destination_supports_transition(false, false));
        // フォーム送信は二重送信を避けるためゲートを通す
        assert!(destination_supports_transition(false, true));
    }
}
