//! CDP 绑定桥 - 基础设施层
//!
//! 通过 `Runtime.addBinding` 在页面中注册一个全局函数，页面调用它时 CDP 会推送
//! `Runtime.bindingCalled` 事件，这里按 payload 把事件转发给对应的订阅者

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// 页面中可调用的绑定函数名
pub const BINDING_NAME: &str = "__autoApplyNotify";

type Routes = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<()>>>>;

/// 绑定事件路由
pub struct BindingBridge {
    routes: Routes,
    next_key: AtomicU64,
}

impl BindingBridge {
    /// 在页面上注册绑定并启动事件转发任务
    pub async fn install(page: &Page) -> Result<Self> {
        page.execute(AddBindingParams::new(BINDING_NAME))
            .await
            .context("注册页面绑定失败")?;

        let mut events = page
            .event_listener::<EventBindingCalled>()
            .await
            .context("订阅绑定事件失败")?;

        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let task_routes = routes.clone();

        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.name != BINDING_NAME {
                    continue;
                }
                trace!("绑定事件: {}", event.payload);
                let sender = lock(&task_routes).get(&event.payload).cloned();
                if let Some(sender) = sender {
                    let _ = sender.send(());
                }
            }
            debug!("页面绑定事件流已结束");
            // 关闭所有订阅，等待方会收到 None
            lock(&task_routes).clear();
        });

        Ok(Self {
            routes,
            next_key: AtomicU64::new(1),
        })
    }

    /// 分配一个新路由，返回 payload 键和接收端
    pub fn open_route(&self, kind: &str) -> (String, mpsc::UnboundedReceiver<()>) {
        let key = format!("{}:{}", kind, self.next_key.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.routes).insert(key.clone(), sender);
        (key, receiver)
    }

    /// 返回一个移除路由的闭包，供订阅 drop 时调用
    pub fn route_remover(&self, key: String) -> impl FnOnce() + Send + Sync + 'static {
        let routes = self.routes.clone();
        move || {
            lock(&routes).remove(&key);
        }
    }
}

fn lock(routes: &Routes) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<()>>> {
    routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
