//! 页面能力接口 - 基础设施层
//!
//! 上层只通过 `HostPage` 访问页面，生产环境由 `CdpPage` 实现，测试中使用内存假页面

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::FileInjectionError;
use crate::models::Locator;

/// 页面中已定位元素的句柄
///
/// 只是一个编号，元素随时可能被宿主页面移除，使用前应重新定位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// 需要向宿主页面派发的合成事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }
}

/// 页面内已拉取的文件（保存在页面侧）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: u64,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

/// 页面事件订阅（DOM 变化批次、点击或页面加载）
///
/// 每个订阅独占一个观察者，drop 时释放
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<()>,
    on_drop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<()>,
        on_drop: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// 等待下一次通知；页面关闭后返回 `None`
    pub async fn next(&mut self) -> Option<()> {
        self.receiver.recv().await
    }

    /// 丢弃已经排队的通知，返回丢弃的数量
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.on_drop.take() {
            dispose();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// 宿主页面
///
/// 职责：
/// - 只暴露读、写、点击、观察等原子能力
/// - 不认识站点 / 职位 / 申请流程
#[async_trait]
pub trait HostPage: Send + Sync {
    /// 当前页面的 hostname
    async fn hostname(&self) -> Result<String>;

    /// 按定位器查找第一个匹配的元素
    async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>>;

    /// 元素的可见文本
    async fn inner_text(&self, element: ElementHandle) -> Result<Option<String>>;

    /// 设置输入控件的值（不派发事件）
    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<()>;

    /// 派发冒泡的合成事件
    async fn dispatch(&self, element: ElementHandle, event: DomEvent) -> Result<()>;

    /// 在页面内拉取文件并保存为 File 对象
    async fn fetch_file(&self, url: &str, file_name: &str)
        -> Result<RemoteFile, FileInjectionError>;

    /// 把已拉取的文件赋给 file input
    async fn attach_file(
        &self,
        element: ElementHandle,
        file: &RemoteFile,
    ) -> Result<(), FileInjectionError>;

    /// 点击元素
    async fn click(&self, element: ElementHandle) -> Result<()>;

    /// 订阅页面根节点的结构变化，每个变化批次通知一次
    async fn observe_mutations(&self) -> Result<Subscription>;

    /// 订阅元素的点击
    async fn listen_clicks(&self, element: ElementHandle) -> Result<Subscription>;

    /// 订阅页面加载完成，每次导航后通知一次；页面关闭时订阅结束
    async fn page_loads(&self) -> Result<Subscription>;

    /// 向用户显示提示（不阻塞页面脚本）
    async fn alert(&self, message: &str) -> Result<()>;
}
