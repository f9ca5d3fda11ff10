//! TransitionEngine: soft navigation の実行
//!
//! `navigate()` が唯一の入口で、リンククリックや popstate のハンドラーは
//! ここに集約される。判断はすべて `suspense-router` の純粋ロジックに任せ、
//! このモジュールは fetch・DOMParser・History・スワップの実行だけを行う。
//!
//! 失敗時の方針: fetch 失敗・非対応レスポンス・遷移先の機能フラグ欠如は
//! どれも `location.href = 遷移先` のフルリロードに縮退する。
//! 中途半端に適用された DOM をユーザーに見せない。リトライもしない。

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{
    Document, DomParser, Element, Event, EventTarget, FormData, Headers, History,
    HtmlTemplateElement, Location, PopStateEvent, ReadableStreamDefaultReader, Request,
    RequestInit, Response, ScrollBehavior, ScrollRestoration, ScrollToOptions, SupportedType, Url,
    Window,
};

use suspense_router::{
    classify_media_type, classify_popstate, destination_supports_transition, plan_navigation,
    router_should_attach, select_strategy, Direction, Fallback, HistoryMode, HistoryTracker,
    NavigateDecision, NavigationOptions, NavigationState, PopAction, ScrollThrottle,
    ThrottleDecision, TransitionPhase, TransitionPhases, TransitionStrategy,
    ANNOUNCE_DELAY_MS, SCROLL_THROTTLE_MS,
};
use suspense_wire::{
    ENABLED_MARKER_NAME, FALLBACK_MARKER_NAME, PERSIST_ATTR, TRANSITION_HEADER,
    TRANSITION_HEADER_VALUE,
};

use crate::anim;
use crate::decoder::SuspenseStreamReader;
use crate::islands;
use crate::loader::SuspenseLoader;
use crate::scripts;
use crate::swap;

/// 遷移方向マーカー（documentElement に付ける）
const DIRECTION_ATTR: &str = "data-astro-transition";

/// ドキュメント外で navigate が呼ばれたときの警告は 1 回だけ
static NAVIGATE_OFF_DOCUMENT_WARNED: AtomicBool = AtomicBool::new(false);

/// ルーターの内部状態
///
/// モジュールレベルのグローバルにはせず、ドキュメント単位で 1 つ構築して
/// 各ハンドラーが共有する。
struct RouterInner {
    window: Window,
    document: Document,
    history: History,
    tracker: HistoryTracker,
    throttle: ScrollThrottle,
    phases: TransitionPhases,
    /// 進行中ナビゲーションのリーダーのキャンセルハンドル。
    /// 同時に生きるリーダーはドキュメントあたり最大 1 つ
    active_reader: Option<ReadableStreamDefaultReader>,
    /// client:only スタイル回収（dev ツーリング連携）を行うか
    dev: bool,
}

/// ドキュメント単位の soft navigation ルーター
#[wasm_bindgen]
pub struct SuspenseRouter {
    inner: Rc<RefCell<RouterInner>>,
}

#[wasm_bindgen]
impl SuspenseRouter {
    /// ルーターを構築する（リスナーはまだ張らない）
    ///
    /// # 引数
    /// - `dev`: client:only コンポーネントのスタイル回収を有効にするか。
    ///   省略時は無効（本番ビルド相当）。
    #[wasm_bindgen(constructor)]
    pub fn new(dev: Option<bool>) -> Result<SuspenseRouter, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let history = window.history()?;

        Ok(SuspenseRouter {
            inner: Rc::new(RefCell::new(RouterInner {
                window,
                document,
                history,
                tracker: HistoryTracker::new(),
                throttle: ScrollThrottle::new(),
                phases: TransitionPhases::new(),
                active_reader: None,
                dev: dev.unwrap_or(false),
            })),
        })
    }

    /// ルーターを起動する
    ///
    /// - Fragment ローダーを常駐させる
    /// - 既存の History state を採択する（なければ初期エントリを作る）
    /// - popstate / load / scroll リスナーを張る
    /// - 初期ロード済みの script に実行済みマーカーを付ける
    pub fn attach(&self) -> Result<(), JsValue> {
        let (window, document, history) = {
            let inner = self.inner.borrow();
            (
                inner.window.clone(),
                inner.document.clone(),
                inner.history.clone(),
            )
        };

        SuspenseLoader::install(&document)?;

        match state_from_js(&history.state().unwrap_or(JsValue::NULL)) {
            Some(state) => {
                // state 付きページのリロード/外部からの履歴流入:
                // index を引き継ぎ、保存されたスクロール位置に戻す
                self.inner.borrow_mut().tracker.adopt(state.index);
                scroll_to(&window, state.scroll_x, state.scroll_y);
            }
            None => {
                // アドレスバー直打ちや外部リンクからの初回ロード
                if transition_enabled(&document) {
                    let initial = NavigationState::initial(
                        window.scroll_x().unwrap_or(0.0),
                        window.scroll_y().unwrap_or(0.0),
                    );
                    replace_state(&history, &initial, None)?;
                }
            }
        }

        let native = anim::native_view_transitions_supported(&document);
        if router_should_attach(native, fallback_of(&document)) {
            self.listen_popstate(&window)?;
            self.listen_load(&window, &document)?;
            self.listen_scroll(&window)?;
        }

        scripts::mark_all_executed(&document)?;
        Ok(())
    }

    /// programmatic navigation の唯一の入口
    ///
    /// # 引数
    /// - `href`: 遷移先（相対 URL 可）
    /// - `history_mode`: "auto" / "push" / "replace"（省略時 auto）
    /// - `form_data`: フォーム送信なら POST ボディ
    pub fn navigate(&self, href: &str, history_mode: Option<String>, form_data: Option<FormData>) {
        if web_sys::window().is_none() {
            // 非インタラクティブなレンダリング中の呼び出しは誤用。
            // 例外ではなく 1 回だけ警告して no-op にする
            if !NAVIGATE_OFF_DOCUMENT_WARNED.swap(true, Ordering::Relaxed) {
                web_sys::console::warn_1(&JsValue::from_str(
                    "navigate() was called outside a browser document; \
                     expected to run in response to user interaction",
                ));
            }
            return;
        }

        let options = NavigationOptions {
            mode: match history_mode.as_deref() {
                Some("push") => HistoryMode::Push,
                Some("replace") => HistoryMode::Replace,
                _ => HistoryMode::Auto,
            },
            is_form: form_data.is_some(),
        };

        let inner = self.inner.clone();
        let href = href.to_string();
        spawn_local(async move {
            if let Err(err) = navigate_inner(inner, &href, options, form_data).await {
                web_sys::console::warn_2(
                    &JsValue::from_str("suspense router: navigation failed, falling back"),
                    &err,
                );
                full_reload(&href);
            }
        });
    }

    // ===== リスナー設置 =====

    fn listen_popstate(&self, window: &Window) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let closure = Closure::<dyn FnMut(PopStateEvent)>::new(move |event: PopStateEvent| {
            on_popstate(&inner, &event);
        });
        window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())?;
        // ドキュメントと同寿命のリスナー
        closure.forget();
        Ok(())
    }

    fn listen_load(&self, window: &Window, document: &Document) -> Result<(), JsValue> {
        let document = document.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            dispatch(&document, "astro:page-load");
        });
        window.add_event_listener_with_callback("load", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// スクロール位置を現エントリに記録し続ける
    ///
    /// scrollend が使えればイベント駆動、なければスロットル付き scroll。
    fn listen_scroll(&self, window: &Window) -> Result<(), JsValue> {
        if js_sys::Reflect::has(window, &JsValue::from_str("onscrollend")).unwrap_or(false) {
            let inner = self.inner.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                record_scroll_position(&inner);
            });
            window
                .add_event_listener_with_callback("scrollend", closure.as_ref().unchecked_ref())?;
            closure.forget();
            return Ok(());
        }

        let inner = self.inner.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let decision = inner.borrow_mut().throttle.on_event();
            match decision {
                ThrottleDecision::RunAndSchedule => {
                    record_scroll_position(&inner);
                    schedule_throttle_timeout(&inner);
                }
                ThrottleDecision::Swallow => {}
            }
        });
        let mut options = web_sys::AddEventListenerOptions::new();
        options.passive(true);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        closure.forget();
        Ok(())
    }
}

/// スロットル窓の満了タイマーを仕掛ける
fn schedule_throttle_timeout(inner: &Rc<RefCell<RouterInner>>) {
    let window = inner.borrow().window.clone();
    let inner = inner.clone();
    let on_timeout = Closure::once_into_js(move || {
        // 窓の中で飲み込んだイベントがあれば最後の位置をもう 1 回記録する
        if inner.borrow_mut().throttle.on_timeout() {
            record_scroll_position(&inner);
        }
    });
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        on_timeout.unchecked_ref(),
        SCROLL_THROTTLE_MS as i32,
    );
}

/// popstate の分類と実行
fn on_popstate(inner: &Rc<RefCell<RouterInner>>, event: &PopStateEvent) {
    let (window, document, history) = {
        let borrowed = inner.borrow();
        (
            borrowed.window.clone(),
            borrowed.document.clone(),
            borrowed.history.clone(),
        )
    };

    let enabled = transition_enabled(&document);
    let state = state_from_js(&event.state());
    let action = classify_popstate(enabled, state, &mut inner.borrow_mut().tracker);

    match action {
        PopAction::Foreign => {
            // ブラウザ管理のエントリはブラウザに任せる
            let _ = history.set_scroll_restoration(ScrollRestoration::Auto);
        }
        PopAction::ReloadRequired => {
            let _ = history.set_scroll_restoration(ScrollRestoration::Manual);
            let _ = window.location().reload();
        }
        PopAction::IntraPageScroll { scroll_x, scroll_y } => {
            let _ = history.set_scroll_restoration(ScrollRestoration::Manual);
            scroll_to(&window, scroll_x, scroll_y);
        }
        PopAction::Traverse { direction, state } => {
            // "auto" のままだと view transition の完了前にブラウザが
            // 古いスクロール位置へ飛んでしまう
            let _ = history.set_scroll_restoration(ScrollRestoration::Manual);
            let href = window.location().href().unwrap_or_default();
            let inner = inner.clone();
            spawn_local(async move {
                let Ok(to) = Url::new(&href) else { return };
                let result = transition(
                    inner,
                    direction,
                    to,
                    NavigationOptions::default(),
                    None,
                    Some(state),
                )
                .await;
                if result.is_err() {
                    full_reload(&href);
                }
            });
        }
    }
}

/// navigate() の本体: 要求を分類して実行する
async fn navigate_inner(
    inner: Rc<RefCell<RouterInner>>,
    href: &str,
    options: NavigationOptions,
    form_data: Option<FormData>,
) -> Result<(), JsValue> {
    let (window, document) = {
        let borrowed = inner.borrow();
        (borrowed.window.clone(), borrowed.document.clone())
    };
    let location = window.location();

    let base = location.href()?;
    let Ok(to) = Url::new_with_base(href, &base) else {
        // パースできない URL はブラウザに任せる
        full_reload(href);
        return Ok(());
    };

    let decision = plan_navigation(
        transition_enabled(&document),
        &page_of_location(&location)?,
        &page_of_url(&to),
        &options,
    );

    match decision {
        NavigateDecision::FullReload => {
            location.set_href(&to.href())?;
        }
        NavigateDecision::IntraPage { replace } => {
            inner.borrow_mut().phases = TransitionPhases::new();
            advance_phase(&inner, TransitionPhase::Intercepted)?;
            move_to_location(&inner, &to, replace, true)?;
            advance_phase(&inner, TransitionPhase::Idle)?;
        }
        NavigateDecision::Transition => {
            transition(inner, Direction::Forward, to, options, form_data, None).await?;
        }
    }
    Ok(())
}

/// soft transition 1 回分の実行
///
/// fetch → シェルのパース → （アニメーション付き）スワップ → 履歴更新 →
/// script 再実行 → ストリーム排出 → 通知、の順で進む。
async fn transition(
    inner: Rc<RefCell<RouterInner>>,
    direction: Direction,
    mut to: Url,
    options: NavigationOptions,
    form_data: Option<FormData>,
    pop_state: Option<NavigationState>,
) -> Result<(), JsValue> {
    let (window, document, dev) = {
        let borrowed = inner.borrow();
        (
            borrowed.window.clone(),
            borrowed.document.clone(),
            borrowed.dev,
        )
    };

    {
        let mut borrowed = inner.borrow_mut();
        borrowed.phases = TransitionPhases::new();
        // 追い越されたナビゲーションのリーダーを止める。
        // DOM を触るデコーダーはドキュメントあたり同時に 1 つまで
        if let Some(previous) = borrowed.active_reader.take() {
            let _ = previous.cancel();
        }
    }
    advance_phase(&inner, TransitionPhase::Intercepted)?;
    advance_phase(&inner, TransitionPhase::Fetching)?;

    // ===== fetch =====
    let mut init = RequestInit::new();
    let headers = Headers::new()?;
    headers.set(TRANSITION_HEADER, TRANSITION_HEADER_VALUE)?;
    init.headers(&headers);
    if let Some(form_data) = &form_data {
        init.method("POST");
        init.body(Some(form_data.as_ref()));
    }
    let request = Request::new_with_str_and_init(&to.href(), &init)?;

    let Ok(fetched) = JsFuture::from(window.fetch_with_request(&request)).await else {
        // ネットワーク失敗はブラウザナビゲーションに任せる
        full_reload(&to.href());
        advance_phase(&inner, TransitionPhase::Idle)?;
        return Ok(());
    };
    let response: Response = fetched.unchecked_into();

    let content_type = response.headers().get("content-type")?;
    let kind = classify_media_type(content_type.as_deref());
    let (Some(kind), true) = (kind, response.ok()) else {
        // 非 2xx / 扱えない content-type。部分適用はしない
        full_reload(&to.href());
        advance_phase(&inner, TransitionPhase::Idle)?;
        return Ok(());
    };

    // リダイレクトされた場合、アドレスバーには最終 URL を出す
    if response.redirected() {
        to = Url::new(&response.url())?;
    }

    // ===== シェルの取得 =====
    let mut reader: Option<SuspenseStreamReader> = None;
    let shell = if kind.is_stream() {
        let Some(body) = response.body() else {
            full_reload(&to.href());
            advance_phase(&inner, TransitionPhase::Idle)?;
            return Ok(());
        };
        let mut stream_reader = SuspenseStreamReader::new(body);
        inner.borrow_mut().active_reader = Some(stream_reader.cancel_handle());
        match stream_reader.next_record().await? {
            Some(shell) => {
                reader = Some(stream_reader);
                shell
            }
            None => {
                full_reload(&to.href());
                advance_phase(&inner, TransitionPhase::Idle)?;
                return Ok(());
            }
        }
    } else {
        JsFuture::from(response.text()?)
            .await?
            .as_string()
            .unwrap_or_default()
    };

    // ===== パース =====
    advance_phase(&inner, TransitionPhase::Parsing)?;
    let parser = DomParser::new()?;
    let supported = match kind.parse_as() {
        "application/xhtml+xml" => SupportedType::ApplicationXhtmlXml,
        _ => SupportedType::TextHtml,
    };
    let new_document = parser.parse_from_string(&shell, supported)?;
    // DOMParser は noscript の中身をマークアップとして返すため先に落とす
    swap::strip_noscript(&new_document)?;

    // 遷移先の機能ゲート: 新ページが宣言していなければ soft swap しない
    let enabled_marker = new_document
        .query_selector(&marker_selector(ENABLED_MARKER_NAME))?
        .is_some();
    if !destination_supports_transition(enabled_marker, options.is_form) {
        full_reload(&to.href());
        advance_phase(&inner, TransitionPhase::Idle)?;
        return Ok(());
    }

    if dev {
        islands::prepare_client_only_styles(&window, &document, &new_document, &to.href()).await?;
    }

    // 離脱前に現エントリへスクロール位置を記録する（履歴移動なら不要）
    if pop_state.is_none() {
        record_scroll_position(&inner);
    }

    if let Some(root) = document.document_element() {
        root.set_attribute(DIRECTION_ATTR, direction_attr(direction))?;
    }

    // ===== スワップ =====
    advance_phase(&inner, TransitionPhase::Swapping)?;
    let replace = matches!(options.mode, HistoryMode::Replace);

    if anim::native_view_transitions_supported(&document) {
        // スワップをネイティブ view transition の中で走らせる。
        // コールバックは Promise を返し、transition がその完了を待つ
        let update = {
            let inner = inner.clone();
            let new_document = new_document.clone();
            let to = to.clone();
            Closure::once_into_js(move || -> JsValue {
                future_to_promise(async move {
                    update_dom(
                        inner,
                        new_document,
                        to,
                        replace,
                        pop_state,
                        TransitionStrategy::PlainSwap,
                    )
                    .await?;
                    Ok(JsValue::UNDEFINED)
                })
                .into()
            })
        };
        if let Some(finished) = anim::start_view_transition(&document, update.unchecked_ref())? {
            let _ = JsFuture::from(finished).await;
        }
    } else {
        let strategy = select_strategy(false, fallback_of(&document));
        update_dom(
            inner.clone(),
            new_document,
            to.clone(),
            replace,
            pop_state,
            strategy,
        )
        .await?;
    }

    // ===== settle =====
    advance_phase(&inner, TransitionPhase::Settling)?;
    scripts::run_scripts(&document).await?;

    if let Some(mut reader) = reader {
        loop {
            match reader.next_record().await {
                Ok(Some(chunk)) => {
                    insert_fragment(&document, &chunk)?;
                    // chunk が新しい script を挿入した場合に備えて 2 回流す
                    scripts::run_scripts(&document).await?;
                    scripts::run_scripts(&document).await?;
                }
                // キャンセル（追い越し）も終端として扱う
                Ok(None) | Err(_) => break,
            }
        }
    }

    dispatch(&document, "astro:page-load");
    announce(&window, &document)?;
    advance_phase(&inner, TransitionPhase::Idle)?;
    Ok(())
}

/// head/body のスワップと履歴更新（必要ならフォールバックアニメーション込み）
async fn update_dom(
    inner: Rc<RefCell<RouterInner>>,
    new_document: Document,
    to: Url,
    replace: bool,
    pop_state: Option<NavigationState>,
    strategy: TransitionStrategy,
) -> Result<(), JsValue> {
    let (window, document) = {
        let borrowed = inner.borrow();
        (borrowed.window.clone(), borrowed.document.clone())
    };

    preload_stylesheets(&document, &new_document).await?;

    match strategy {
        TransitionStrategy::AnimatedSwap => {
            // 退出アニメーションの完了を待ってからスワップし、
            // 進入アニメーションは属性の付け替えで非同期に走らせる
            anim::run_exit_animations(&window, &document).await?;
            swap_now(&inner, &window, &document, &new_document, &to, replace, pop_state)?;
            anim::mark_new_state(&document);
        }
        _ => {
            swap_now(&inner, &window, &document, &new_document, &to, replace, pop_state)?;
        }
    }
    Ok(())
}

/// スワップ本体（同期区間）: DOM 差し替え → スクロール/履歴 → 通知
fn swap_now(
    inner: &Rc<RefCell<RouterInner>>,
    window: &Window,
    document: &Document,
    new_document: &Document,
    to: &Url,
    replace: bool,
    pop_state: Option<NavigationState>,
) -> Result<(), JsValue> {
    swap::swap_documents(document, new_document)?;

    match pop_state {
        // 履歴移動は保存済みのスクロール位置へ
        Some(state) => scroll_to(window, state.scroll_x, state.scroll_y),
        None => move_to_location(inner, to, replace, false)?,
    }

    dispatch(document, "astro:after-swap");
    Ok(())
}

/// 履歴エントリを更新し、新しいページのスクロール規則を適用する
///
/// - forward: 現エントリに intra-page フラグを記録してから、
///   index を 1 進めた新エントリを積む（スクロールはゼロから）
/// - replace: state を保ったまま URL だけ差し替える
/// - 別ページへの移動は URL 確定後すぐ先頭へスクロールする
/// - hash 付きなら既に同じページに居るので fragment へのスクロールに任せる
fn move_to_location(
    inner: &Rc<RefCell<RouterInner>>,
    to: &Url,
    replace: bool,
    intra_page: bool,
) -> Result<(), JsValue> {
    let (window, history) = {
        let borrowed = inner.borrow();
        (borrowed.window.clone(), borrowed.history.clone())
    };
    let location = window.location();

    let current_href = location.href()?;
    let target = page_of_url(to);
    let fresh = !page_of_location(&location)?.same_page(&target);
    let mut scrolled_to_top = false;

    if to.href() != current_href {
        if replace {
            let state = history.state().unwrap_or(JsValue::NULL);
            history.replace_state_with_url(&state, "", Some(&to.href()))?;
        } else {
            if let Some(mut state) = state_from_js(&history.state().unwrap_or(JsValue::NULL)) {
                state.intra_page = intra_page;
                replace_state(&history, &state, None)?;
            }
            let index = inner.borrow_mut().tracker.advance();
            push_state(&history, &NavigationState::fresh(index), &to.href())?;
        }
        // URL が変わった時点でもう新しいページに居る。
        // 新規ページは先頭から表示する
        if fresh {
            scroll_to(&window, 0.0, 0.0);
            scrolled_to_top = true;
        }
    }

    if !target.hash.is_empty() {
        // 既に目的ページに居るため、これはリロードを起こさない
        // fragment への intra-page スクロールになる
        location.set_href(&to.href())?;
    } else if !scrolled_to_top {
        scroll_to(&window, 0.0, 0.0);
    }
    Ok(())
}

/// 新ドキュメントの stylesheet を先読みする
///
/// スワップ直後のスタイル欠落によるちらつきを避けるため、
/// 現ページに無い stylesheet は preload の完了を待ってからスワップする。
async fn preload_stylesheets(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    let links = new_document.query_selector_all("head link[rel=stylesheet]")?;
    let mut waits: Vec<Promise> = Vec::new();

    for i in 0..links.length() {
        let Some(node) = links.get(i) else { continue };
        let link: Element = node.unchecked_into();
        let Some(href) = link.get_attribute("href") else {
            continue;
        };

        // 既にページにあるものは先読みしない
        let selector = match link.get_attribute(PERSIST_ATTR) {
            Some(key) => format!(
                "[{}=\"{}\"], link[rel=stylesheet][href=\"{}\"]",
                PERSIST_ATTR, key, href
            ),
            None => format!("link[rel=stylesheet][href=\"{}\"]", href),
        };
        if document.query_selector(&selector)?.is_some() {
            continue;
        }

        let preload = document.create_element("link")?;
        preload.set_attribute("rel", "preload")?;
        preload.set_attribute("as", "style")?;
        preload.set_attribute("href", &href)?;
        waits.push(settled_on_load_or_error(&preload));
        if let Some(head) = document.head() {
            head.append_child(&preload)?;
        }
    }

    for promise in waits {
        // エラーでも先へ進む（スタイル欠落はフルリロードに値しない）
        let _ = JsFuture::from(promise).await;
    }
    Ok(())
}

/// load / error のどちらかで解決する Promise を作る
fn settled_on_load_or_error(element: &Element) -> Promise {
    let target: EventTarget = element.clone().unchecked_into();
    Promise::new(&mut |resolve, _reject| {
        for name in ["load", "error"] {
            let resolve = resolve.clone();
            let on_event = Closure::once_into_js(move |_event: Event| {
                let _ = resolve.call0(&JsValue::NULL);
            });
            let _ = target.add_event_listener_with_callback(name, on_event.unchecked_ref());
        }
    })
}

/// streaming chunk を body に差し込む
///
/// template 経由で挿入するため、chunk 内の script はこの時点では走らない
/// （直後の `run_scripts` が実行する）。
fn insert_fragment(document: &Document, chunk: &str) -> Result<(), JsValue> {
    let template: HtmlTemplateElement = document.create_element("template")?.unchecked_into();
    template.set_inner_html(chunk);
    if let Some(body) = document.body() {
        body.append_child(&template.content())?;
    }
    Ok(())
}

/// 新しいタイトルをスクリーンリーダーへ通知する
///
/// aria-live 要素を先に挿入し、少し遅らせてからテキストを入れる。
/// 間を置かないと支援技術が変化を検知しないことがある。
fn announce(window: &Window, document: &Document) -> Result<(), JsValue> {
    let announcer = document.create_element("div")?;
    announcer.set_attribute("aria-live", "assertive")?;
    announcer.set_attribute("aria-atomic", "true")?;
    announcer.set_attribute("class", "astro-route-announcer")?;
    if let Some(body) = document.body() {
        body.append_child(&announcer)?;
    }

    let document = document.clone();
    let on_timeout = Closure::once_into_js(move || {
        let title = if !document.title().is_empty() {
            document.title()
        } else if let Some(h1) = document.query_selector("h1").ok().flatten() {
            h1.text_content().unwrap_or_default()
        } else {
            document
                .location()
                .and_then(|l| l.pathname().ok())
                .unwrap_or_default()
        };
        announcer.set_text_content(Some(&title));
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        on_timeout.unchecked_ref(),
        ANNOUNCE_DELAY_MS as i32,
    )?;
    Ok(())
}

// ===== 小さなヘルパー =====

/// 現在のスクロール位置を現エントリに記録する
///
/// state を持たないエントリ（ブラウザ管理）には触らない。
fn record_scroll_position(inner: &Rc<RefCell<RouterInner>>) {
    let (window, history) = {
        let borrowed = inner.borrow();
        (borrowed.window.clone(), borrowed.history.clone())
    };
    let Some(state) = state_from_js(&history.state().unwrap_or(JsValue::NULL)) else {
        return;
    };
    let updated = state.with_scroll(
        window.scroll_x().unwrap_or(0.0),
        window.scroll_y().unwrap_or(0.0),
    );
    let _ = replace_state(&history, &updated, None);
}

fn advance_phase(inner: &Rc<RefCell<RouterInner>>, phase: TransitionPhase) -> Result<(), JsValue> {
    inner
        .borrow_mut()
        .phases
        .advance(phase)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn marker_selector(name: &str) -> String {
    format!("[name=\"{}\"]", name)
}

/// 現在のページが soft navigation 対応を宣言しているか
fn transition_enabled(document: &Document) -> bool {
    document
        .query_selector(&marker_selector(ENABLED_MARKER_NAME))
        .ok()
        .flatten()
        .is_some()
}

/// ページが宣言したフォールバック方式
fn fallback_of(document: &Document) -> Fallback {
    let content = document
        .query_selector(&marker_selector(FALLBACK_MARKER_NAME))
        .ok()
        .flatten()
        .and_then(|el| el.get_attribute("content"));
    Fallback::from_marker(content.as_deref())
}

fn direction_attr(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Back => "back",
    }
}

fn dispatch(document: &Document, name: &str) {
    if let Ok(event) = Event::new(name) {
        let _ = document.dispatch_event(&event);
    }
}

fn scroll_to(window: &Window, x: f64, y: f64) {
    let mut options = ScrollToOptions::new();
    options.left(x).top(y).behavior(ScrollBehavior::Instant);
    window.scroll_to_with_scroll_to_options(&options);
}

fn full_reload(href: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(href);
    }
}

fn page_of_url(url: &Url) -> suspense_router::PageLocation {
    suspense_router::PageLocation {
        origin: url.origin(),
        pathname: url.pathname(),
        search: url.search(),
        hash: url.hash(),
    }
}

fn page_of_location(location: &Location) -> Result<suspense_router::PageLocation, JsValue> {
    Ok(suspense_router::PageLocation {
        origin: location.origin()?,
        pathname: location.pathname()?,
        search: location.search()?,
        hash: location.hash()?,
    })
}

/// History state への保存はプレーンな JS オブジェクトとして行う
/// （他のスクリプトからも普通の state に見えるように）
fn state_to_js(state: &NavigationState) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(state).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn state_from_js(value: &JsValue) -> Option<NavigationState> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let json: String = js_sys::JSON::stringify(value).ok()?.into();
    serde_json::from_str(&json).ok()
}

fn replace_state(history: &History, state: &NavigationState, url: Option<&str>) -> Result<(), JsValue> {
    let js = state_to_js(state)?;
    match url {
        Some(url) => history.replace_state_with_url(&js, "", Some(url)),
        None => history.replace_state(&js, ""),
    }
}

fn push_state(history: &History, state: &NavigationState, url: &str) -> Result<(), JsValue> {
    let js = state_to_js(state)?;
    history.push_state_with_url(&js, "", Some(url))
}
