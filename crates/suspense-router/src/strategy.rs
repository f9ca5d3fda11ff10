//! アニメーション戦略の選択
//!
//! ブラウザのネイティブ view transition が使えればそれを、
//! なければページが宣言したフォールバックに従う。
//! 選択は遷移ごとに 1 回だけ行う。

/// view transition 非対応ブラウザでの挙動（ページがマーカー要素で宣言する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// soft navigation 自体を行わない
    None,
    /// CSS アニメーションで擬似的に再現する
    Animate,
    /// アニメーションなしで即スワップする
    Swap,
}

impl Fallback {
    /// フォールバックマーカーの content 属性値から決定する
    ///
    /// マーカーがない・不明な値の場合は `Animate`。
    pub fn from_marker(content: Option<&str>) -> Self {
        match content {
            Some("none") => Fallback::None,
            Some("swap") => Fallback::Swap,
            _ => Fallback::Animate,
        }
    }
}

/// 遷移 1 回に適用するスワップ戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStrategy {
    /// プラットフォームの view transition 内でスワップを実行する
    Native,
    /// データ属性で CSS アニメーションを起動してからスワップする
    AnimatedSwap,
    /// そのままスワップする
    PlainSwap,
}

/// 戦略を選択する（capability チェック、遷移ごとに 1 回）
pub fn select_strategy(native_supported: bool, fallback: Fallback) -> TransitionStrategy {
    if native_supported {
        TransitionStrategy::Native
    } else {
        match fallback {
            Fallback::Animate => TransitionStrategy::AnimatedSwap,
            // None は attach 段階で弾かれるため、ここまで来たら素のスワップ
            Fallback::None | Fallback::Swap => TransitionStrategy::PlainSwap,
        }
    }
}

/// ルーターのイベントリスナーを張るべきか
///
/// ネイティブ対応か、フォールバックが `none` 以外なら張る。
pub fn router_should_attach(native_supported: bool, fallback: Fallback) -> bool {
    native_supported || fallback != Fallback::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_parsing() {
        assert_eq!(Fallback::from_marker(None), Fallback::Animate);
        assert_eq!(Fallback::from_marker(Some("none")), Fallback::None);
        assert_eq!(Fallback::from_marker(Some("swap")), Fallback::Swap);
        assert_eq!(Fallback::from_marker(Some("animate")), Fallback::Animate);
        assert_eq!(Fallback::from_marker(Some("???")), Fallback::Animate);
    }

    #[test]
    fn test_native_wins_over_fallback() {
        assert_eq!(
            select_strategy(true, Fallback::Swap),
            TransitionStrategy::Native
        );
    }

    #[test]
    fn test_fallback_selection_without_native() {
        assert_eq!(
            select_strategy(false, Fallback::Animate),
            TransitionStrategy::AnimatedSwap
        );
        assert_eq!(
            select_strategy(false, Fallback::Swap),
            TransitionStrategy::PlainSwap
        );
    }

    #[test]
    fn test_attach_condition() {
        assert!(router_should_attach(true, Fallback::None));
        assert!(router_should_attach(false, Fallback::Animate));
        assert!(!router_should_attach(false, Fallback::None));
    }
}
