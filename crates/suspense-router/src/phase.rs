//! ナビゲーション 1 回分の状態機械

use crate::error::RouterError;

/// 遷移の進行段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// 待機中（進行中のナビゲーションなし）
    Idle,
    /// navigate() が要求を受理した
    Intercepted,
    /// 遷移先を fetch 中（この段階まではキャンセル可能）
    Fetching,
    /// シェルを detached ドキュメントにパース中
    Parsing,
    /// DOM スワップ実行中（以降はキャンセル不可）
    Swapping,
    /// script 再実行・ストリーム排出・通知
    Settling,
}

/// 段階遷移の追跡
///
/// 許可された順以外への advance は呼び出し側のバグとしてエラーにする。
/// Fetching / Parsing からの Idle 復帰はフルリロードへの脱出を表す。
#[derive(Debug)]
pub struct TransitionPhases {
    current: TransitionPhase,
}

impl TransitionPhases {
    pub fn new() -> Self {
        TransitionPhases {
            current: TransitionPhase::Idle,
        }
    }

    pub fn current(&self) -> TransitionPhase {
        self.current
    }

    /// DOM スワップ後はキャンセルできない
    pub fn cancellable(&self) -> bool {
        matches!(
            self.current,
            TransitionPhase::Intercepted | TransitionPhase::Fetching | TransitionPhase::Parsing
        )
    }

    /// 次の段階へ進める
    pub fn advance(&mut self, next: TransitionPhase) -> Result<(), RouterError> {
        if Self::allowed(self.current, next) {
            self.current = next;
            Ok(())
        } else {
            Err(RouterError::IllegalPhase {
                from: self.current,
                to: next,
            })
        }
    }

    fn allowed(from: TransitionPhase, to: TransitionPhase) -> bool {
        use TransitionPhase::*;
        matches!(
            (from, to),
            (Idle, Intercepted)
                // intra-page / フルリロードで即終了
                | (Intercepted, Idle)
                | (Intercepted, Fetching)
                // fetch 失敗・非対応レスポンス → フルリロード脱出
                | (Fetching, Idle)
                | (Fetching, Parsing)
                // 遷移先の機能フラグ欠如 → フルリロード脱出
                | (Parsing, Idle)
                | (Parsing, Swapping)
                | (Swapping, Settling)
                | (Settling, Idle)
        )
    }
}

impl Default for TransitionPhases {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransitionPhase::*;

    #[test]
    fn test_full_successful_cycle() {
        let mut phases = TransitionPhases::new();
        for next in [Intercepted, Fetching, Parsing, Swapping, Settling, Idle] {
            phases.advance(next).unwrap();
        }
        assert_eq!(phases.current(), Idle);
    }

    #[test]
    fn test_abort_to_full_reload_from_fetching() {
        let mut phases = TransitionPhases::new();
        phases.advance(Intercepted).unwrap();
        phases.advance(Fetching).unwrap();
        phases.advance(Idle).unwrap();
    }

    #[test]
    fn test_swap_cannot_be_abandoned() {
        let mut phases = TransitionPhases::new();
        for next in [Intercepted, Fetching, Parsing, Swapping] {
            phases.advance(next).unwrap();
        }
        assert!(!phases.cancellable());
        let err = phases.advance(Idle).unwrap_err();
        assert_eq!(
            err,
            RouterError::IllegalPhase {
                from: Swapping,
                to: Idle
            }
        );
    }

    #[test]
    fn test_fetch_phase_is_cancellable() {
        let mut phases = TransitionPhases::new();
        phases.advance(Intercepted).unwrap();
        phases.advance(Fetching).unwrap();
        assert!(phases.cancellable());
    }

    #[test]
    fn test_cannot_skip_phases() {
        let mut phases = TransitionPhases::new();
        assert!(phases.advance(Swapping).is_err());
    }
}
