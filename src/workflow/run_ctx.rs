//! 页面处理上下文
//!
//! 封装"我正在处理第几个页面、哪个站点"这一信息，只用于日志

use std::fmt::Display;

/// 页面处理上下文
#[derive(Debug, Clone, Default)]
pub struct RunCtx {
    /// 页面索引（从1开始，仅用于日志显示）
    pub page_index: usize,

    /// 页面 hostname
    pub hostname: String,

    /// 匹配到的站点名，未匹配时为空
    pub site_name: Option<String>,
}

impl RunCtx {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            ..Default::default()
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.site_name {
            Some(site) => write!(f, "[页面 #{} {} {}]", self.page_index, site, self.hostname),
            None if self.hostname.is_empty() => write!(f, "[页面 #{}]", self.page_index),
            None => write!(f, "[页面 #{} {}]", self.page_index, self.hostname),
        }
    }
}
