//! 基于 chromiumoxide 的页面实现 - 基础设施层

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::EventLoadEventFired;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::FileInjectionError;
use crate::infrastructure::binding_bridge::{BindingBridge, BINDING_NAME};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::page::{DomEvent, ElementHandle, HostPage, RemoteFile, Subscription};
use crate::models::Locator;

const HOSTNAME: &str = "return window.location.hostname;";

const QUERY: &str = r#"
    let el;
    try {
        el = document.querySelector(args.selector);
    } catch (e) {
        throw new Error(`invalid locator ${args.selector}: ${e.message}`);
    }
    if (!el) return { found: false, id: 0 };
    if (!el.__autoApplyId) {
        el.__autoApplyId = registry.nextId++;
    }
    registry.elements.set(el.__autoApplyId, el);
    return { found: true, id: el.__autoApplyId };
"#;

const INNER_TEXT: &str = r#"
    const el = lookup(args.id);
    const text = el.innerText ?? el.textContent;
    return { text: text == null ? "" : String(text) };
"#;

// 走原型上的 value setter，React 等框架才能感知到变化
const SET_VALUE: &str = r#"
    const el = lookup(args.id);
    const descriptor = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), "value");
    if (descriptor && descriptor.set) {
        descriptor.set.call(el, args.value);
    } else {
        el.value = args.value;
    }
    return true;
"#;

const DISPATCH: &str = r#"
    lookup(args.id).dispatchEvent(new Event(args.event, { bubbles: true }));
    return true;
"#;

const CLICK: &str = r#"
    lookup(args.id).click();
    return true;
"#;

const FETCH_FILE: &str = r#"
    let response;
    try {
        response = await fetch(args.url);
    } catch (e) {
        return { ok: false, message: String(e && e.message || e) };
    }
    if (!response.ok) {
        return { ok: false, message: `${response.status} ${response.statusText}` };
    }
    const blob = await response.blob();
    const file = new File([blob], args.fileName, { type: blob.type });
    const id = registry.nextId++;
    registry.files.set(id, file);
    return { ok: true, id, mime: blob.type, size: blob.size };
"#;

const ATTACH_FILE: &str = r#"
    const el = lookup(args.id);
    const file = registry.files.get(args.fileId);
    registry.files.delete(args.fileId);
    if (!file) {
        return { ok: false, restricted: false, message: "fetched file is no longer available" };
    }
    try {
        const transfer = new DataTransfer();
        transfer.items.add(file);
        el.files = transfer.files;
    } catch (e) {
        return { ok: false, restricted: true, message: `${e.name}: ${e.message}` };
    }
    if (!el.files || el.files.length === 0) {
        return { ok: false, restricted: true, message: "the input did not accept the file list" };
    }
    return { ok: true, restricted: false, message: "" };
"#;

const OBSERVE: &str = r#"
    const observer = new MutationObserver(() => window[args.binding](args.key));
    observer.observe(document.documentElement, { childList: true, subtree: true });
    registry.observers.set(args.key, observer);
    return true;
"#;

const DISCONNECT: &str = r#"
    const observer = registry.observers.get(args.key);
    if (observer) observer.disconnect();
    registry.observers.delete(args.key);
    const entry = registry.listeners.get(args.key);
    if (entry) entry.el.removeEventListener("click", entry.listener);
    registry.listeners.delete(args.key);
    return true;
"#;

const LISTEN_CLICKS: &str = r#"
    const el = lookup(args.id);
    const listener = () => window[args.binding](args.key);
    el.addEventListener("click", listener);
    registry.listeners.set(args.key, { el, listener });
    return true;
"#;

// alert() 会阻塞 Runtime.evaluate，放到下一轮事件循环里弹出
const ALERT: &str = r#"
    setTimeout(() => window.alert(args.message), 0);
    return true;
"#;

#[derive(Debug, Deserialize)]
struct QueryResult {
    found: bool,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct TextResult {
    text: String,
}

#[derive(Debug, Deserialize)]
struct FetchResult {
    ok: bool,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AttachResult {
    ok: bool,
    restricted: bool,
    message: String,
}

/// 通过 CDP 驱动的真实浏览器页面
pub struct CdpPage {
    executor: JsExecutor,
    bridge: BindingBridge,
}

impl CdpPage {
    /// 接管一个已打开的页面
    pub async fn attach(page: Page) -> Result<Self> {
        let bridge = BindingBridge::install(&page).await?;
        Ok(Self {
            executor: JsExecutor::new(page),
            bridge,
        })
    }

    async fn subscribe(&self, kind: &str, script: &str, extra: JsonValue) -> Result<Subscription> {
        let (key, receiver) = self.bridge.open_route(kind);
        let remove_route = self.bridge.route_remover(key.clone());

        let mut args = json!({ "key": key, "binding": BINDING_NAME });
        if let (Some(args), JsonValue::Object(extra)) = (args.as_object_mut(), extra) {
            args.extend(extra);
        }
        if let Err(e) = self.executor.eval_with::<bool>(script, args).await {
            remove_route();
            return Err(e);
        }

        let page = self.executor.page().clone();
        Ok(Subscription::new(receiver, move || {
            remove_route();
            // drop 不能 await，页面侧的清理交给后台任务
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let executor = JsExecutor::new(page);
                    if let Err(e) = executor
                        .eval_with::<bool>(DISCONNECT, json!({ "key": key }))
                        .await
                    {
                        debug!("释放页面订阅 {} 失败: {}", key, e);
                    }
                });
            }
        }))
    }
}

#[async_trait]
impl HostPage for CdpPage {
    async fn hostname(&self) -> Result<String> {
        self.executor.eval_with(HOSTNAME, json!({})).await
    }

    async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let result: QueryResult = self
            .executor
            .eval_with(QUERY, json!({ "selector": locator.as_str() }))
            .await?;
        Ok(result.found.then_some(ElementHandle(result.id)))
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<Option<String>> {
        let result: TextResult = self
            .executor
            .eval_with(INNER_TEXT, json!({ "id": element.0 }))
            .await?;
        Ok(Some(result.text))
    }

    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<()> {
        self.executor
            .eval_with::<bool>(SET_VALUE, json!({ "id": element.0, "value": value }))
            .await
            .context("设置输入值失败")?;
        Ok(())
    }

    async fn dispatch(&self, element: ElementHandle, event: DomEvent) -> Result<()> {
        self.executor
            .eval_with::<bool>(DISPATCH, json!({ "id": element.0, "event": event.name() }))
            .await
            .with_context(|| format!("派发 {} 事件失败", event.name()))?;
        Ok(())
    }

    async fn fetch_file(
        &self,
        url: &str,
        file_name: &str,
    ) -> Result<RemoteFile, FileInjectionError> {
        let result: FetchResult = self
            .executor
            .eval_with(FETCH_FILE, json!({ "url": url, "fileName": file_name }))
            .await
            .map_err(|e| FileInjectionError::Page(format!("{:#}", e)))?;

        if !result.ok {
            return Err(FileInjectionError::FetchFailed {
                url: url.to_string(),
                message: result.message,
            });
        }

        Ok(RemoteFile {
            id: result.id,
            name: file_name.to_string(),
            mime: result.mime,
            size: result.size,
        })
    }

    async fn attach_file(
        &self,
        element: ElementHandle,
        file: &RemoteFile,
    ) -> Result<(), FileInjectionError> {
        let result: AttachResult = self
            .executor
            .eval_with(ATTACH_FILE, json!({ "id": element.0, "fileId": file.id }))
            .await
            .map_err(|e| FileInjectionError::Page(format!("{:#}", e)))?;

        match (result.ok, result.restricted) {
            (true, _) => Ok(()),
            (false, true) => Err(FileInjectionError::PlatformRestricted(result.message)),
            (false, false) => Err(FileInjectionError::Page(result.message)),
        }
    }

    async fn click(&self, element: ElementHandle) -> Result<()> {
        self.executor
            .eval_with::<bool>(CLICK, json!({ "id": element.0 }))
            .await
            .context("点击元素失败")?;
        Ok(())
    }

    async fn observe_mutations(&self) -> Result<Subscription> {
        self.subscribe("mutation", OBSERVE, json!({})).await
    }

    async fn listen_clicks(&self, element: ElementHandle) -> Result<Subscription> {
        self.subscribe("click", LISTEN_CLICKS, json!({ "id": element.0 }))
            .await
    }

    async fn page_loads(&self) -> Result<Subscription> {
        let mut events = self
            .executor
            .page()
            .event_listener::<EventLoadEventFired>()
            .await
            .context("订阅页面加载事件失败")?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                trace!("页面加载完成: {:?}", event.timestamp);
                if sender.send(()).is_err() {
                    break;
                }
            }
            debug!("页面加载事件流已结束");
        });

        let abort = task.abort_handle();
        Ok(Subscription::new(receiver, move || abort.abort()))
    }

    async fn alert(&self, message: &str) -> Result<()> {
        self.executor
            .eval_with::<bool>(ALERT, json!({ "message": message }))
            .await?;
        Ok(())
    }
}
