//! LoaderBootstrap: ブラウザ側ローダーを確立する一回限りの inline JS
//!
//! 最初の chunk の先頭に `<script>…</script>` として 1 度だけ埋め込まれる。
//! これがドキュメント単位のデコーダー（DOMPatcher）をブラウザに常駐させる。
//!
//! ## ローダーの動作
//!
//! 1. `astro-suspense` カスタム要素を（未定義なら）定義する
//! 2. `document.body` を MutationObserver で監視し、プレースホルダー挿入を検知したら
//!    同じ ID の template と原子的にスワップする
//! 3. load 完了後は observer を切断する（以降は直接エントリポイント経由）
//! 4. `window.astroSuspenseLoad(id)` — chunk の inline script から呼ばれる
//!    直接エントリポイント。observer 接続前に存在したマーカーもここで拾う。
//!
//! スワップは冪等: 同じ ID で 2 回呼んでも template が既に消えているため no-op。

use alloc::format;
use alloc::string::String;

/// ブラウザに常駐するローダー本体（生 JS）
///
/// WASM ランタイムが無いページ（初回のサーバーレンダリング）でも
/// 単体で動くよう、依存なしの素の JS として送る。
pub const LOADER_BOOTSTRAP: &str = r#"(() => {
  let element = customElements.get("astro-suspense");
  if (!element) {
    class AstroSuspense extends HTMLElement {}
    element = AstroSuspense;
    customElements.define("astro-suspense", AstroSuspense);
  }
  const observer = new MutationObserver((list) => {
    list.map((mutation) => {
      mutation.addedNodes.forEach((node) => {
        if (node instanceof element) {
          const template = document.querySelector(
            `template[astro-suspense-id='${node.getAttribute("suspense-id")}']`,
          );
          if (template) {
            node.replaceWith(template.content);
            template.remove();
          }
        }
      });
    });
  });
  observer.observe(document.body, { childList: true, subtree: true });
  document.addEventListener("DOMContentLoaded", () => observer.disconnect());
})();
window.astroSuspenseLoad = (id) => {
  const script = document.querySelector(`script[astro-suspense-id='${id}']`);
  const template = document.querySelector(`template[astro-suspense-id='${id}']`);
  const suspense = document.querySelector(`astro-suspense[suspense-id='${id}']`);
  if (suspense && template) {
    suspense.replaceWith(template.content);
    template.remove();
  }
  if (script) script.remove();
};"#;

/// `<script>` タグで包んだブートストラップを返す
pub fn bootstrap_script() -> String {
    format!("<script>{}</script>", LOADER_BOOTSTRAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_is_wrapped_in_script_tag() {
        let script = bootstrap_script();
        assert!(script.starts_with("<script>"));
        assert!(script.ends_with("</script>"));
    }

    #[test]
    fn test_bootstrap_defines_global_entry_point() {
        // chunk の inline script との唯一の結合点
        assert!(LOADER_BOOTSTRAP.contains("window.astroSuspenseLoad"));
    }

    #[test]
    fn test_bootstrap_has_no_premature_script_close() {
        // <script> 内に埋め込むため、本体が </script> を含んではいけない
        assert!(!LOADER_BOOTSTRAP.contains("</script>"));
    }
}
