//! 宏工具函数

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{Expr, FnArg, Ident, Lit, Pat, Result, Type};

/// 从字符串字面量表达式中取值
pub fn parse_string(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            other => Err(syn::Error::new_spanned(other, "期望字符串字面量")),
        },
        other => Err(syn::Error::new_spanned(other, "期望字符串字面量")),
    }
}

/// 从 `["a", "b"]` 形式的数组表达式中取出字符串列表
pub fn parse_string_array(expr: &Expr) -> Result<Vec<String>> {
    match expr {
        Expr::Array(array) => array.elems.iter().map(parse_string).collect(),
        other => Err(syn::Error::new_spanned(other, "期望字符串数组，例如 [\"a\", \"b\"]")),
    }
}

/// 取出函数参数的名称与类型
///
/// 只接受形如 `name: Type` 的参数，`self` 与解构模式会报错。
pub fn typed_param(arg: &FnArg) -> Result<(&Ident, &Type)> {
    match arg {
        FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(
            receiver,
            "可注入函数不能带有 self 参数",
        )),
        FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
            Pat::Ident(pat_ident) => Ok((&pat_ident.ident, pat_type.ty.as_ref())),
            other => Err(syn::Error::new_spanned(
                other,
                "可注入函数的参数必须是简单标识符",
            )),
        },
    }
}

/// 标识符对应的令牌名称（去掉 `r#` 前缀）
pub fn token_name(ident: &Ident) -> String {
    ident.unraw().to_string()
}

/// 生成唯一的标识符
pub fn generate_unique_ident(base_name: &str, suffix: &str) -> Ident {
    let unique_name = format!("__{}__{}", base_name, suffix);
    Ident::new(&unique_name, Span::call_site())
}
