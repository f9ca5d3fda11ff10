//! スクロール記録のスロットル
//!
//! scrollend 非対応ブラウザでは scroll イベントのたびに History へ書き込むと
//! 多すぎるため、一定間隔に間引く。待機中に飲み込んだイベントは
//! タイマー満了時に 1 回だけ追加実行して、最後のスクロール位置を取りこぼさない。
//!
//! タイマー自体はホスト（setTimeout）が持つ。ここは判断だけ。

/// スクロールイベントに対する判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// 今すぐ実行し、スロットル窓のタイマーを開始する
    RunAndSchedule,
    /// 窓の中なので実行しない（満了時にまとめて 1 回実行される）
    Swallow,
}

/// 間引きの状態機械
#[derive(Debug, Default)]
pub struct ScrollThrottle {
    /// スロットル窓が開いているか
    waiting: bool,
    /// 窓の中でイベントを飲み込んだか
    swallowed: bool,
}

impl ScrollThrottle {
    pub fn new() -> Self {
        ScrollThrottle::default()
    }

    /// スクロールイベント発生時に呼ぶ
    pub fn on_event(&mut self) -> ThrottleDecision {
        if self.waiting {
            self.swallowed = true;
            ThrottleDecision::Swallow
        } else {
            self.waiting = true;
            ThrottleDecision::RunAndSchedule
        }
    }

    /// スロットル窓のタイマー満了時に呼ぶ
    ///
    /// # 戻り値
    /// - `true`: 窓の中で飲み込んだイベントがあったので、もう 1 回実行する
    /// - `false`: 何もしない
    pub fn on_timeout(&mut self) -> bool {
        let rerun = self.swallowed;
        self.swallowed = false;
        self.waiting = false;
        rerun
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event_runs_immediately() {
        let mut throttle = ScrollThrottle::new();
        assert_eq!(throttle.on_event(), ThrottleDecision::RunAndSchedule);
    }

    #[test]
    fn test_events_in_window_are_swallowed_then_replayed_once() {
        let mut throttle = ScrollThrottle::new();
        throttle.on_event();
        assert_eq!(throttle.on_event(), ThrottleDecision::Swallow);
        assert_eq!(throttle.on_event(), ThrottleDecision::Swallow);

        // 満了時、飲み込んだ分はまとめて 1 回
        assert!(throttle.on_timeout());
        // 次の満了では何も残っていない
        assert!(!throttle.on_timeout());
    }

    #[test]
    fn test_quiet_window_does_not_rerun() {
        let mut throttle = ScrollThrottle::new();
        throttle.on_event();
        assert!(!throttle.on_timeout());
        // 窓が閉じたので次のイベントはまた即時実行
        assert_eq!(throttle.on_event(), ThrottleDecision::RunAndSchedule);
    }
}
