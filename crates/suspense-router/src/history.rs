//! History エントリの追跡と popstate の分類
//!
//! History API は popstate が「進む」なのか「戻る」なのかを教えてくれない。
//! そこで pushState のたびに index を +1 してエントリに保存し、
//! popstate で届いた index を手元の現在値と比較して方向を導出する。

use serde::{Deserialize, Serialize};

/// History エントリ 1 件に保存するナビゲーション状態
///
/// フィールド名は History state にそのまま JSON として保存される形
/// （ブラウザ側の命名に合わせて camelCase）。
///
/// 不変条件: `index` は forward ナビゲーションのたびにちょうど 1 増え、
/// 減ることはない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// pushState ごとに +1 される通し番号
    pub index: u64,
    /// このエントリを離れた時点の水平スクロール位置
    #[serde(rename = "scrollX")]
    pub scroll_x: f64,
    /// このエントリを離れた時点の垂直スクロール位置
    #[serde(rename = "scrollY")]
    pub scroll_y: f64,
    /// 同一ページ内（hash のみ）のナビゲーションで作られたエントリか
    #[serde(rename = "intraPage", default)]
    pub intra_page: bool,
}

impl NavigationState {
    /// 初回ロード時のエントリ（index 0、現在のスクロール位置）
    pub fn initial(scroll_x: f64, scroll_y: f64) -> Self {
        NavigationState {
            index: 0,
            scroll_x,
            scroll_y,
            intra_page: false,
        }
    }

    /// forward ナビゲーションで積む新エントリ（スクロールはゼロから）
    pub fn fresh(index: u64) -> Self {
        NavigationState {
            index,
            scroll_x: 0.0,
            scroll_y: 0.0,
            intra_page: false,
        }
    }

    /// スクロール位置だけ差し替えたコピーを返す（離脱前の記録用）
    pub fn with_scroll(self, scroll_x: f64, scroll_y: f64) -> Self {
        NavigationState {
            scroll_x,
            scroll_y,
            ..self
        }
    }
}

/// popstate で導出するナビゲーション方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// ドキュメント単位の現在 index 追跡
///
/// モジュールレベルの可変グローバルにはせず、Router が 1 つ所有して
/// ハンドラーに参照で渡す。
#[derive(Debug, Default)]
pub struct HistoryTracker {
    current_index: u64,
}

impl HistoryTracker {
    /// 新しいトラッカーを生成する（index 0 = 初回ロード）
    pub fn new() -> Self {
        HistoryTracker { current_index: 0 }
    }

    /// 既存の History state を持つページのリロード時に index を引き継ぐ
    pub fn adopt(&mut self, index: u64) {
        self.current_index = index;
    }

    /// forward ナビゲーション: index を 1 進めて新しい値を返す
    pub fn advance(&mut self) -> u64 {
        self.current_index += 1;
        self.current_index
    }

    /// 現在の index
    pub fn current(&self) -> u64 {
        self.current_index
    }

    /// 届いた index から方向を導出する（大きければ forward、小さければ back）
    pub fn direction_of(&self, incoming: u64) -> Direction {
        if incoming > self.current_index {
            Direction::Forward
        } else {
            Direction::Back
        }
    }

    /// popstate で移動した先の index に現在値を合わせる
    pub fn follow(&mut self, incoming: u64) {
        self.current_index = incoming;
    }
}

/// popstate イベントに対して取るべき動作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopAction {
    /// state なし = ブラウザ管理のエントリ（hash リンク等）。何もしない
    Foreign,
    /// 現在のページが soft navigation 非対応なのに state 付きエントリへ来た。
    /// 古いページのルーターでは扱えないためフルリロードする
    ReloadRequired,
    /// 同一ページ内エントリ: fetch せずスクロール復元のみ
    IntraPageScroll { scroll_x: f64, scroll_y: f64 },
    /// 別ページへの履歴移動: 保存済みスクロール位置付きで遷移を実行
    Traverse {
        direction: Direction,
        state: NavigationState,
    },
}

/// popstate イベントを分類する
///
/// # 引数
/// - `enabled_here`: 現在表示中のページが transition 機能を宣言しているか
/// - `state`: エントリに保存されていた state（なければ None）
/// - `tracker`: 現在 index の追跡（Traverse のとき更新される）
pub fn classify_popstate(
    enabled_here: bool,
    state: Option<NavigationState>,
    tracker: &mut HistoryTracker,
) -> PopAction {
    let Some(state) = state else {
        return PopAction::Foreign;
    };

    if !enabled_here {
        // state を積んだのは遷移先ページのルーター。こちらには復元コードがない
        return PopAction::ReloadRequired;
    }

    if state.intra_page {
        return PopAction::IntraPageScroll {
            scroll_x: state.scroll_x,
            scroll_y: state.scroll_y,
        };
    }

    let direction = tracker.direction_of(state.index);
    tracker.follow(state.index);
    PopAction::Traverse { direction, state }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_increases_by_exactly_one_per_forward() {
        let mut tracker = HistoryTracker::new();
        for expected in 1..=5 {
            assert_eq!(tracker.advance(), expected);
        }
        assert_eq!(tracker.current(), 5);
    }

    #[test]
    fn test_direction_from_index_comparison() {
        let mut tracker = HistoryTracker::new();
        tracker.adopt(3);
        assert_eq!(tracker.direction_of(2), Direction::Back);
        assert_eq!(tracker.direction_of(4), Direction::Forward);
        // 同値は back 扱い（forward は必ず index が増えるため起こらない）
        assert_eq!(tracker.direction_of(3), Direction::Back);
    }

    #[test]
    fn test_stateless_entry_is_foreign() {
        let mut tracker = HistoryTracker::new();
        let action = classify_popstate(true, None, &mut tracker);
        assert_eq!(action, PopAction::Foreign);
    }

    #[test]
    fn test_disabled_page_with_state_requires_reload() {
        let mut tracker = HistoryTracker::new();
        let state = NavigationState::fresh(2);
        let action = classify_popstate(false, Some(state), &mut tracker);
        assert_eq!(action, PopAction::ReloadRequired);
    }

    #[test]
    fn test_intra_page_entry_scrolls_without_fetch() {
        let mut tracker = HistoryTracker::new();
        let state = NavigationState::initial(10.0, 250.0).with_scroll(0.0, 480.0);
        let state = NavigationState {
            intra_page: true,
            ..state
        };
        let action = classify_popstate(true, Some(state), &mut tracker);
        assert_eq!(
            action,
            PopAction::IntraPageScroll {
                scroll_x: 0.0,
                scroll_y: 480.0
            }
        );
    }

    #[test]
    fn test_traverse_back_then_forward() {
        let mut tracker = HistoryTracker::new();
        tracker.advance();
        tracker.advance(); // 現在 index 2

        let back = classify_popstate(true, Some(NavigationState::fresh(1)), &mut tracker);
        match back {
            PopAction::Traverse { direction, state } => {
                assert_eq!(direction, Direction::Back);
                assert_eq!(state.index, 1);
            }
            other => panic!("unexpected action: {:?}", other),
        }

        // 戻ったあとに進む
        let forward = classify_popstate(true, Some(NavigationState::fresh(2)), &mut tracker);
        assert!(matches!(
            forward,
            PopAction::Traverse {
                direction: Direction::Forward,
                ..
            }
        ));
        assert_eq!(tracker.current(), 2);
    }

    #[test]
    fn test_state_json_roundtrip_uses_browser_field_names() {
        let state = NavigationState::fresh(4).with_scroll(1.5, 99.0);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"scrollX\":1.5"));
        assert!(json.contains("\"intraPage\":false"));
        let back: NavigationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_state_without_intra_page_field_defaults_false() {
        // 古いエントリや手で作られた state にも耐える
        let back: NavigationState =
            serde_json::from_str(r#"{"index":1,"scrollX":0.0,"scrollY":0.0}"#).unwrap();
        assert!(!back.intra_page);
    }
}
