//! 可注入单元宏实现

use crate::utils;
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Ident, ItemFn, Meta, Result, Token,
};

/// 可注入单元参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectableArgs {
    /// 显式令牌，未给出时从参数名推断
    pub tokens: Option<Vec<String>>,
    /// 是否生成构造单元
    pub constructor: bool,
    /// 诊断名称
    pub name: Option<String>,
}

impl Parse for InjectableArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = InjectableArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::Path(path) if path.is_ident("constructor") => {
                    args.constructor = true;
                }
                Meta::NameValue(nv) if nv.path.is_ident("tokens") => {
                    args.tokens = Some(utils::parse_string_array(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    args.name = Some(utils::parse_string(&nv.value)?);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "未知参数，可用参数: tokens, constructor, name",
                    ))
                }
            }
        }

        Ok(args)
    }
}

/// 实现 #[injectable] 宏
pub fn injectable_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    expand(args.into(), input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: TokenStream2, input: TokenStream2) -> Result<TokenStream2> {
    let injectable_args = if args.is_empty() {
        InjectableArgs::default()
    } else {
        syn::parse2::<InjectableArgs>(args)?
    };
    let function: ItemFn = syn::parse2(input)?;
    let signature = &function.sig;

    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "可注入函数不能是 async"));
    }
    if !signature.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &signature.generics,
            "可注入函数不能带有泛型参数",
        ));
    }

    let mut names = Vec::new();
    let mut types = Vec::new();
    for input in &signature.inputs {
        let (ident, ty) = utils::typed_param(input)?;
        names.push(utils::token_name(ident));
        types.push(ty);
    }

    let fn_name = &signature.ident;
    let base_name = utils::token_name(fn_name);
    let unit_fn = format_ident!("{}_unit", base_name);
    let unit_name = injectable_args.name.clone().unwrap_or(base_name);
    let visibility = &function.vis;

    let bindings: Vec<Ident> = (0..names.len())
        .map(|index| format_ident!("__arg{}", index))
        .collect();
    let indices = 0..names.len();
    let call = quote! { #fn_name(#(#bindings),*) };

    let extract = quote! {
        #( let #bindings = __args.extract::<#types>(#indices)?; )*
    };

    let unit = match (&injectable_args.tokens, injectable_args.constructor) {
        (Some(tokens), constructor) => {
            if tokens.len() != names.len() {
                return Err(syn::Error::new(
                    Span::call_site(),
                    format!(
                        "tokens 数量 ({}) 与参数数量 ({}) 不一致",
                        tokens.len(),
                        names.len()
                    ),
                ));
            }
            let count = tokens.len();
            let tokens = quote! {
                {
                    let __tokens: [&'static str; #count] = [#(#tokens),*];
                    __tokens
                }
            };
            if constructor {
                quote! {
                    ::di_abstractions::Unit::constructor(#tokens, |__args: ::di_abstractions::Args| -> ::di_abstractions::DependencyResult<::di_abstractions::Construction> {
                        #extract
                        Ok(::di_abstractions::Construction::Constructed(
                            ::di_abstractions::IntoValue::into_value(#call)?,
                        ))
                    })
                }
            } else {
                quote! {
                    ::di_abstractions::Unit::annotated(#tokens, |__args: ::di_abstractions::Args| -> ::di_abstractions::DependencyResult<::di_abstractions::Value> {
                        #extract
                        ::di_abstractions::IntoValue::into_value(#call)
                    })
                }
            }
        }
        (None, constructor) => {
            let signature = names.join(", ");
            if constructor {
                quote! {
                    ::di_abstractions::Unit::inferred_constructor(#signature, |__args: ::di_abstractions::Args| -> ::di_abstractions::DependencyResult<::di_abstractions::Construction> {
                        #extract
                        Ok(::di_abstractions::Construction::Constructed(
                            ::di_abstractions::IntoValue::into_value(#call)?,
                        ))
                    })
                }
            } else {
                quote! {
                    ::di_abstractions::Unit::inferred(#signature, |__args: ::di_abstractions::Args| -> ::di_abstractions::DependencyResult<::di_abstractions::Value> {
                        #extract
                        ::di_abstractions::IntoValue::into_value(#call)
                    })
                }
            }
        }
    };

    let doc = format!("`{}` 对应的注入单元", fn_name);

    Ok(quote! {
        #function

        #[doc = #doc]
        #visibility fn #unit_fn() -> ::di_abstractions::Unit {
            #unit.named(#unit_name)
        }
    })
}
