//! 模块声明宏实现

use crate::utils;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, ItemFn, Meta, Result, Token,
};

/// 模块声明参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleArgs {
    /// 模块名称
    pub name: Option<String>,
    /// 依赖的模块
    pub requires: Vec<String>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = ModuleArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    args.name = Some(utils::parse_string(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("requires") => {
                    args.requires = utils::parse_string_array(&nv.value)?;
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "未知参数，可用参数: name, requires",
                    ))
                }
            }
        }

        Ok(args)
    }
}

/// 实现 #[module] 宏
pub fn module_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    expand(args.into(), input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: TokenStream2, input: TokenStream2) -> Result<TokenStream2> {
    let module_args = if args.is_empty() {
        ModuleArgs::default()
    } else {
        syn::parse2::<ModuleArgs>(args)?
    };
    let function: ItemFn = syn::parse2(input)?;
    let signature = &function.sig;

    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "模块声明函数不能是 async"));
    }
    if signature.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &signature.inputs,
            "模块声明函数必须形如 fn(Module) -> Module",
        ));
    }

    let fn_name = &signature.ident;
    let base_name = utils::token_name(fn_name);
    let module_name = module_args.name.unwrap_or_else(|| base_name.clone());
    let requires = &module_args.requires;
    let register_fn = utils::generate_unique_ident("register_module", &base_name);

    Ok(quote! {
        #function

        // 使用 ctor 在程序启动时注册模块
        #[::ctor::ctor]
        fn #register_fn() {
            let requires: ::std::vec::Vec<&'static str> = ::std::vec![#(#requires),*];
            ::di_abstractions::ModuleCatalog::global()
                .register(#fn_name(::di_abstractions::Module::new(#module_name, requires)));
        }
    })
}
