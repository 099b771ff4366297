//! 内存中的假页面，用于在没有浏览器的情况下测试流程
//!
//! 定位器按字符串精确匹配，不解析 CSS

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::FileInjectionError;
use crate::infrastructure::{DomEvent, ElementHandle, HostPage, RemoteFile, Subscription};
use crate::models::Locator;

#[derive(Debug, Clone, Default)]
struct FakeElement {
    id: u64,
    selector: String,
    text: String,
    value: String,
    events: Vec<DomEvent>,
    files: Vec<RemoteFile>,
    clicks: usize,
}

#[derive(Default)]
struct FakeState {
    hostname: String,
    elements: Vec<FakeElement>,
    next_id: u64,
    mutation_subscribers: HashMap<u64, mpsc::UnboundedSender<()>>,
    click_subscribers: HashMap<u64, (u64, mpsc::UnboundedSender<()>)>,
    load_subscribers: HashMap<u64, mpsc::UnboundedSender<()>>,
    resources: HashMap<String, std::result::Result<(String, u64), String>>,
    fetched: HashMap<u64, RemoteFile>,
    restrict_file_inputs: bool,
    invalid_selectors: Vec<String>,
    alerts: Vec<String>,
    writes: usize,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn element(&mut self, handle: ElementHandle) -> Result<&mut FakeElement> {
        self.elements
            .iter_mut()
            .find(|el| el.id == handle.0)
            .ok_or_else(|| anyhow!("element {} is no longer attached to the page", handle.0))
    }

    fn by_selector(&self, selector: &str) -> Option<&FakeElement> {
        self.elements.iter().find(|el| el.selector == selector)
    }

    fn notify_mutation(&self) {
        for sender in self.mutation_subscribers.values() {
            let _ = sender.send(());
        }
    }

    fn notify_click(&self, element_id: u64) {
        for (target, sender) in self.click_subscribers.values() {
            if *target == element_id {
                let _ = sender.send(());
            }
        }
    }
}

/// 假页面
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(hostname: &str) -> Self {
        let page = Self::default();
        page.lock().hostname = hostname.to_string();
        page
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 构造时放入元素（不触发变化通知）
    pub fn with_element(self, selector: &str, text: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id();
            state.elements.push(FakeElement {
                id,
                selector: selector.to_string(),
                text: text.to_string(),
                ..Default::default()
            });
        }
        self
    }

    /// 模拟宿主页面插入元素，通知所有变化订阅者
    pub fn insert(&self, selector: &str, text: &str) -> ElementHandle {
        let mut state = self.lock();
        let id = state.next_id();
        state.elements.push(FakeElement {
            id,
            selector: selector.to_string(),
            text: text.to_string(),
            ..Default::default()
        });
        state.notify_mutation();
        ElementHandle(id)
    }

    /// 模拟宿主页面移除元素
    pub fn remove(&self, selector: &str) {
        let mut state = self.lock();
        state.elements.retain(|el| el.selector != selector);
        state.notify_mutation();
    }

    /// 模拟与目标无关的 DOM 变化
    pub fn touch(&self) {
        self.lock().notify_mutation();
    }

    /// 模拟用户点击
    pub fn user_click(&self, selector: &str) {
        let state = self.lock();
        if let Some(id) = state.by_selector(selector).map(|el| el.id) {
            state.notify_click(id);
        }
    }

    /// 模拟导航到新文档：换 hostname、清空 DOM，通知加载订阅者
    ///
    /// 旧文档上的点击监听不会再收到通知
    pub fn navigate(&self, hostname: &str) {
        let mut state = self.lock();
        state.hostname = hostname.to_string();
        state.elements.clear();
        for sender in state.load_subscribers.values() {
            let _ = sender.send(());
        }
    }

    /// 模拟关闭标签页，所有订阅随之结束
    pub fn close(&self) {
        let mut state = self.lock();
        state.load_subscribers.clear();
        state.click_subscribers.clear();
        state.mutation_subscribers.clear();
    }

    /// 让页面内 fetch 返回指定的文件
    pub fn serve(&self, url: &str, mime: &str, size: u64) {
        self.lock()
            .resources
            .insert(url.to_string(), Ok((mime.to_string(), size)));
    }

    /// 让页面内 fetch 失败
    pub fn fail_fetch(&self, url: &str, message: &str) {
        self.lock()
            .resources
            .insert(url.to_string(), Err(message.to_string()));
    }

    /// 模拟浏览器拒绝给 file input 赋值
    pub fn restrict_file_inputs(&self) {
        self.lock().restrict_file_inputs = true;
    }

    /// 模拟非法选择器
    pub fn reject_selector(&self, selector: &str) {
        self.lock().invalid_selectors.push(selector.to_string());
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.lock().by_selector(selector).map(|el| el.value.clone())
    }

    pub fn events_of(&self, selector: &str) -> Vec<DomEvent> {
        self.lock()
            .by_selector(selector)
            .map(|el| el.events.clone())
            .unwrap_or_default()
    }

    pub fn files_of(&self, selector: &str) -> Vec<RemoteFile> {
        self.lock()
            .by_selector(selector)
            .map(|el| el.files.clone())
            .unwrap_or_default()
    }

    pub fn clicks_of(&self, selector: &str) -> usize {
        self.lock()
            .by_selector(selector)
            .map(|el| el.clicks)
            .unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    /// 自动化对页面做过的写操作次数（赋值、挂文件、点击）
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn active_observers(&self) -> usize {
        self.lock().mutation_subscribers.len()
    }

    pub fn active_click_listeners(&self) -> usize {
        self.lock().click_subscribers.len()
    }
}

#[async_trait]
impl HostPage for FakePage {
    async fn hostname(&self) -> Result<String> {
        Ok(self.lock().hostname.clone())
    }

    async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let state = self.lock();
        if state.invalid_selectors.iter().any(|s| s == locator.as_str()) {
            return Err(anyhow!("invalid locator {}", locator));
        }
        let found = state
            .by_selector(locator.as_str())
            .map(|el| ElementHandle(el.id));
        Ok(found)
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<Option<String>> {
        let mut state = self.lock();
        let text = state.element(element)?.text.clone();
        Ok(Some(text))
    }

    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<()> {
        let mut state = self.lock();
        state.element(element)?.value = value.to_string();
        state.writes += 1;
        Ok(())
    }

    async fn dispatch(&self, element: ElementHandle, event: DomEvent) -> Result<()> {
        let mut state = self.lock();
        state.element(element)?.events.push(event);
        Ok(())
    }

    async fn fetch_file(
        &self,
        url: &str,
        file_name: &str,
    ) -> std::result::Result<RemoteFile, FileInjectionError> {
        let mut state = self.lock();
        let (mime, size) = match state.resources.get(url).cloned() {
            Some(Ok(resource)) => resource,
            Some(Err(message)) => {
                return Err(FileInjectionError::FetchFailed {
                    url: url.to_string(),
                    message,
                })
            }
            None => {
                return Err(FileInjectionError::FetchFailed {
                    url: url.to_string(),
                    message: "404 Not Found".to_string(),
                })
            }
        };
        let file = RemoteFile {
            id: state.next_id(),
            name: file_name.to_string(),
            mime,
            size,
        };
        state.fetched.insert(file.id, file.clone());
        Ok(file)
    }

    async fn attach_file(
        &self,
        element: ElementHandle,
        file: &RemoteFile,
    ) -> std::result::Result<(), FileInjectionError> {
        let mut state = self.lock();
        let fetched = state
            .fetched
            .remove(&file.id)
            .ok_or_else(|| FileInjectionError::Page("fetched file is no longer available".into()))?;
        if state.restrict_file_inputs {
            return Err(FileInjectionError::PlatformRestricted(
                "SecurityError: file inputs cannot be assigned programmatically".into(),
            ));
        }
        state
            .element(element)
            .map_err(|e| FileInjectionError::Page(e.to_string()))?
            .files
            .push(fetched);
        state.writes += 1;
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<()> {
        let mut state = self.lock();
        state.element(element)?.clicks += 1;
        state.writes += 1;
        state.notify_click(element.0);
        Ok(())
    }

    async fn observe_mutations(&self) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let key = {
            let mut state = self.lock();
            let key = state.next_id();
            state.mutation_subscribers.insert(key, sender);
            key
        };
        let state = self.state.clone();
        Ok(Subscription::new(receiver, move || {
            let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
            state.mutation_subscribers.remove(&key);
        }))
    }

    async fn listen_clicks(&self, element: ElementHandle) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let key = {
            let mut state = self.lock();
            state.element(element)?;
            let key = state.next_id();
            state.click_subscribers.insert(key, (element.0, sender));
            key
        };
        let state = self.state.clone();
        Ok(Subscription::new(receiver, move || {
            let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
            state.click_subscribers.remove(&key);
        }))
    }

    async fn page_loads(&self) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let key = {
            let mut state = self.lock();
            let key = state.next_id();
            state.load_subscribers.insert(key, sender);
            key
        };
        let state = self.state.clone();
        Ok(Subscription::new(receiver, move || {
            let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
            state.load_subscribers.remove(&key);
        }))
    }

    async fn alert(&self, message: &str) -> Result<()> {
        self.lock().alerts.push(message.to_string());
        Ok(())
    }
}
