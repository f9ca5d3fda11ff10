//! ナビゲーション要求の分類
//!
//! `navigate(href)` が入口。fetch までやる価値があるのか、hash だけの
//! 同一ページ移動なのか、そもそもフルリロードに逃げるべきなのかを決める。

use alloc::string::String;

/// URL をブラウザの URL API で分解した結果
///
/// パースはホスト側（ブラウザ）がやる。コアは比較だけを担当する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub origin: String,
    pub pathname: String,
    pub search: String,
    /// `#` 以降（空文字 = hash なし）
    pub hash: String,
}

impl PageLocation {
    /// 同一ページか（origin + path + query が一致。hash は無視）
    pub fn same_page(&self, other: &PageLocation) -> bool {
        self.origin == other.origin
            && self.pathname == other.pathname
            && self.search == other.search
    }
}

/// History エントリの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// 通常は push、同一 URL なら replace
    #[default]
    Auto,
    Push,
    Replace,
}

/// `navigate()` のオプション
#[derive(Debug, Clone, Default)]
pub struct NavigationOptions {
    pub mode: HistoryMode,
    /// フォーム送信か（副作用があるため同一ページでも fetch する）
    pub is_form: bool,
}

/// ナビゲーション要求に対する決定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateDecision {
    /// soft transition を保証できない。ブラウザに任せてフルリロード
    FullReload,
    /// hash のみの差分: fetch せず履歴とスクロールだけ更新する
    IntraPage { replace: bool },
    /// fetch + DOM スワップの soft transition を実行する
    Transition,
}

/// ナビゲーション要求を分類する
///
/// # 引数
/// - `enabled_here`: 現在のページが transition 機能を宣言しているか
/// - `current`: 現在の location
/// - `target`: 遷移先の location（ブラウザで解決済みの絶対 URL）
/// - `options`: 呼び出しオプション
pub fn plan_navigation(
    enabled_here: bool,
    current: &PageLocation,
    target: &PageLocation,
    options: &NavigationOptions,
) -> NavigateDecision {
    if !enabled_here {
        // このページにはルーターの相方（マーカー）がいない
        return NavigateDecision::FullReload;
    }

    // フォーム送信は副作用があるため同一ページでも fetch する
    if current.same_page(target) && !options.is_form {
        return NavigateDecision::IntraPage {
            replace: matches!(options.mode, HistoryMode::Replace),
        };
    }

    // 別オリジンは fetch が検知してフルリロードに縮退する
    NavigateDecision::Transition
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn loc(pathname: &str, search: &str, hash: &str) -> PageLocation {
        PageLocation {
            origin: "https://example.com".to_string(),
            pathname: pathname.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn test_disabled_page_forces_full_reload() {
        let decision = plan_navigation(
            false,
            &loc("/a", "", ""),
            &loc("/b", "", ""),
            &NavigationOptions::default(),
        );
        assert_eq!(decision, NavigateDecision::FullReload);
    }

    #[test]
    fn test_hash_only_difference_is_intra_page() {
        let decision = plan_navigation(
            true,
            &loc("/same-path", "?x=1", ""),
            &loc("/same-path", "?x=1", "#frag"),
            &NavigationOptions::default(),
        );
        assert_eq!(decision, NavigateDecision::IntraPage { replace: false });
    }

    #[test]
    fn test_query_difference_is_a_real_transition() {
        let decision = plan_navigation(
            true,
            &loc("/same-path", "?x=1", ""),
            &loc("/same-path", "?x=2", ""),
            &NavigationOptions::default(),
        );
        assert_eq!(decision, NavigateDecision::Transition);
    }

    #[test]
    fn test_form_post_to_same_page_still_fetches() {
        let options = NavigationOptions {
            is_form: true,
            ..Default::default()
        };
        let decision = plan_navigation(true, &loc("/a", "", ""), &loc("/a", "", "#x"), &options);
        assert_eq!(decision, NavigateDecision::Transition);
    }

    #[test]
    fn test_replace_mode_flows_into_intra_page() {
        let options = NavigationOptions {
            mode: HistoryMode::Replace,
            ..Default::default()
        };
        let decision = plan_navigation(true, &loc("/a", "", ""), &loc("/a", "", "#y"), &options);
        assert_eq!(decision, NavigateDecision::IntraPage { replace: true });
    }

    #[test]
    fn test_cross_origin_same_path_is_not_same_page() {
        let mut other = loc("/a", "", "");
        other.origin = "https://other.example".to_string();
        assert!(!loc("/a", "", "").same_page(&other));
    }
}
