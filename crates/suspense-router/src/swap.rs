//! DOM スワップの計画
//!
//! head は要素単位の突き合わせ、body は丸ごと差し替え + 永続要素の差し戻し。
//! このモジュールは「どの要素を残すか」の計画だけを立てる。
//! 実際の remove/append はホスト（suspense-wasm）が計画どおりに実行する。

use alloc::string::String;
use alloc::vec::Vec;

/// head 内の 1 要素の突き合わせキー
///
/// - `persist_key`: 永続化属性（`data-astro-transition-persist`）の値
/// - `stylesheet_href`: `link[rel=stylesheet]` の href（キーがない場合の同一性）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadEntry {
    pub persist_key: Option<String>,
    pub stylesheet_href: Option<String>,
}

/// 旧 head の各要素に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadOp {
    /// 旧要素を残し、新ドキュメント側の重複（new_index）を取り除く
    Persist { new_index: usize },
    /// 新ページに対応物がないので旧要素を取り除く
    Remove,
}

/// 旧 head と新 head を突き合わせ、旧要素ごとの操作を返す
///
/// 計画に現れなかった新要素はすべて新規なので、ホストがまとめて append する。
///
/// # 引数
/// - `old`: 現在のドキュメントの head 要素列（DOM 順）
/// - `new`: 遷移先ドキュメントの head 要素列（DOM 順）
pub fn plan_head_swap(old: &[HeadEntry], new: &[HeadEntry]) -> Vec<HeadOp> {
    old.iter()
        .map(|entry| match find_counterpart(entry, new) {
            Some(new_index) => HeadOp::Persist { new_index },
            None => HeadOp::Remove,
        })
        .collect()
}

/// 新 head から旧要素の対応物を探す
///
/// 永続化キーが最優先。キーのない stylesheet は href の一致で同一視する。
fn find_counterpart(entry: &HeadEntry, new: &[HeadEntry]) -> Option<usize> {
    if let Some(key) = &entry.persist_key {
        return new
            .iter()
            .position(|n| n.persist_key.as_deref() == Some(key.as_str()));
    }
    if let Some(href) = &entry.stylesheet_href {
        return new.iter().position(|n| {
            n.persist_key.is_none() && n.stylesheet_href.as_deref() == Some(href.as_str())
        });
    }
    None
}

/// script 要素の同一性シグネチャ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSig {
    /// 外部 script の src（inline なら None）
    pub src: Option<String>,
    /// type 属性
    pub kind: Option<String>,
    /// inline 本文
    pub text: String,
}

impl ScriptSig {
    /// 同じ script とみなすか
    ///
    /// inline は本文一致、外部は src + type の一致。
    pub fn matches(&self, other: &ScriptSig) -> bool {
        match &self.src {
            None => other.src.is_none() && self.text == other.text,
            Some(src) => other.src.as_deref() == Some(src.as_str()) && self.kind == other.kind,
        }
    }
}

/// 新ドキュメントの script のうち、現在のページに既に存在するものを探す
///
/// 見つかった script は実行済みマーカーを付けて二重実行を防ぐ。
///
/// # 戻り値
/// 実行済み扱いにすべき `incoming` のインデックス列
pub fn mark_executed(current: &[ScriptSig], incoming: &[ScriptSig]) -> Vec<usize> {
    incoming
        .iter()
        .enumerate()
        .filter(|(_, sig)| current.iter().any(|cur| cur.matches(sig)))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn keyed(key: &str) -> HeadEntry {
        HeadEntry {
            persist_key: Some(key.to_string()),
            stylesheet_href: None,
        }
    }

    fn stylesheet(href: &str) -> HeadEntry {
        HeadEntry {
            persist_key: None,
            stylesheet_href: Some(href.to_string()),
        }
    }

    fn plain() -> HeadEntry {
        HeadEntry::default()
    }

    #[test]
    fn test_persist_key_keeps_old_element() {
        let old = vec![keyed("header"), plain()];
        let new = vec![plain(), keyed("header")];

        let plan = plan_head_swap(&old, &new);
        assert_eq!(plan, vec![HeadOp::Persist { new_index: 1 }, HeadOp::Remove]);
    }

    #[test]
    fn test_stylesheet_identity_by_href() {
        let old = vec![stylesheet("/main.css"), stylesheet("/old-only.css")];
        let new = vec![stylesheet("/main.css"), stylesheet("/new-only.css")];

        let plan = plan_head_swap(&old, &new);
        assert_eq!(plan, vec![HeadOp::Persist { new_index: 0 }, HeadOp::Remove]);
    }

    #[test]
    fn test_unkeyed_meta_is_replaced() {
        // キーも href もない要素は常に入れ替え（新要素は append 側で入る）
        let plan = plan_head_swap(&[plain()], &[plain()]);
        assert_eq!(plan, vec![HeadOp::Remove]);
    }

    #[test]
    fn test_inline_script_matches_by_text() {
        let current = vec![ScriptSig {
            text: "console.log(1)".to_string(),
            ..Default::default()
        }];
        let incoming = vec![
            ScriptSig {
                text: "console.log(1)".to_string(),
                ..Default::default()
            },
            ScriptSig {
                text: "console.log(2)".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(mark_executed(&current, &incoming), vec![0]);
    }

    #[test]
    fn test_external_script_matches_by_src_and_type() {
        let module = ScriptSig {
            src: Some("/app.js".to_string()),
            kind: Some("module".to_string()),
            text: String::new(),
        };
        let classic = ScriptSig {
            kind: None,
            ..module.clone()
        };

        // type が違えば別物
        assert_eq!(mark_executed(&[module.clone()], &[classic]), Vec::<usize>::new());
        assert_eq!(mark_executed(&[module.clone()], &[module]), vec![0]);
    }
}
