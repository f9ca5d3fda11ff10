//! suspense-router エラー型

use crate::phase::TransitionPhase;

/// ナビゲーションコアのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// 許可されていない状態遷移（呼び出し側のバグ）
    IllegalPhase {
        from: TransitionPhase,
        to: TransitionPhase,
    },
}

impl core::fmt::Display for RouterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RouterError::IllegalPhase { from, to } => {
                write!(f, "Illegal transition phase change: {:?} -> {:?}", from, to)
            }
        }
    }
}
