//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// 每段脚本共用的页面侧注册表
///
/// 元素、文件、观察者和监听器都以编号保存在 `window.__autoApply` 中
const PRELUDE: &str = r#"
    const registry = (window.__autoApply = window.__autoApply || {
        nextId: 1,
        elements: new Map(),
        files: new Map(),
        observers: new Map(),
        listeners: new Map(),
    });
    const lookup = (id) => {
        const el = registry.elements.get(id);
        if (!el || !el.isConnected) {
            registry.elements.delete(id);
            throw new Error(`element ${id} is no longer attached to the page`);
        }
        return el;
    };
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识站点 / 职位
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 代码
    ///
    /// # 返回
    /// 返回 JSON 值
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 以 `args` 为参数执行一段函数体
    ///
    /// 函数体运行在 async 函数中，可以使用 `registry` / `lookup`，必须返回非 undefined 的值
    pub async fn eval_with<T: DeserializeOwned>(&self, body: &str, args: JsonValue) -> Result<T> {
        let script = build_script(body, &args)?;
        self.eval_as(script)
            .await
            .with_context(|| format!("页面脚本执行失败 (参数: {})", args))
    }
}

fn build_script(body: &str, args: &JsonValue) -> Result<String> {
    let args_json = serde_json::to_string(args)?;
    Ok(format!(
        "(async (args) => {{\n{}\n{}\n}})({})",
        PRELUDE, body, args_json
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn script_embeds_arguments_as_json() {
        let script = build_script(
            "return args.selector;",
            &json!({ "selector": "button[data-qa=\"apply-button\"]" }),
        )
        .unwrap();

        assert!(script.starts_with("(async (args) => {"));
        assert!(script.contains("window.__autoApply"));
        assert!(script.ends_with(r#"})({"selector":"button[data-qa=\"apply-button\"]"})"#));
    }
}
