//! 解析路径
//!
//! 两个缓存作用域共享同一条解析路径，用于循环依赖检测和错误信息。

use std::cell::RefCell;

/// 当前正在解析的令牌栈
#[derive(Debug, Default)]
pub(crate) struct ResolutionPath {
    tokens: Vec<String>,
}

impl ResolutionPath {
    /// 路径深度
    pub(crate) fn depth(&self) -> usize {
        self.tokens.len()
    }

    /// 最近进入的令牌在前
    pub(crate) fn most_recent_first(&self) -> impl Iterator<Item = &String> {
        self.tokens.iter().rev()
    }

    /// 以 `token` 开头、接着是整条路径的链条
    pub(crate) fn chain_from(&self, token: &str) -> Vec<String> {
        std::iter::once(token.to_string())
            .chain(self.most_recent_first().cloned())
            .collect()
    }

    fn push(&mut self, token: &str) {
        self.tokens.push(token.to_string());
    }

    fn pop(&mut self) {
        self.tokens.pop();
    }
}

/// 路径守卫：创建时压栈，离开作用域时出栈（包括错误返回与 panic 展开）
pub(crate) struct PathGuard<'a> {
    path: &'a RefCell<ResolutionPath>,
}

impl<'a> PathGuard<'a> {
    pub(crate) fn enter(path: &'a RefCell<ResolutionPath>, token: &str) -> Self {
        path.borrow_mut().push(token);
        Self { path }
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.borrow_mut().pop();
    }
}
