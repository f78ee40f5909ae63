use darling::{FromMeta, ast::NestedMeta};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, FnArg, Ident, Pat, Result, ReturnType, TraitItemFn, Type, Visibility};

#[derive(Debug, Default, FromMeta)]
struct FunctionArgs {
    /// Remote path; defaults to the fn name.
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    model: Option<String>,
    #[darling(default)]
    description: Option<String>,
}

struct Param {
    ident: Ident,
    ty: Type,
}

pub fn function_impl(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let args = parse_args(attr)?;

    // A leading visibility is not part of a trait-style fn, so peel it off first.
    let (vis, item) = split_visibility(item)?;
    let input = syn::parse2::<TraitItemFn>(item)?;
    let sig = &input.sig;
    let fn_name = &sig.ident;

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "remote functions cannot be generic",
        ));
    }

    let instructions = extract_instructions(&input.attrs).ok_or_else(|| {
        syn::Error::new_spanned(
            fn_name,
            "remote functions need a doc comment; it becomes the function's instructions",
        )
    })?;

    let output_ty = match &sig.output {
        ReturnType::Type(_, ty) => (**ty).clone(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                sig,
                "remote functions must declare an output type",
            ));
        }
    };

    let params = parse_params(sig.inputs.iter())?;
    let remote_name = args.name.unwrap_or_else(|| fn_name.to_string());
    let definition_fn = format_ident!("{}_definition", fn_name);

    // Input type: the only parameter's type, `()` for none, a generated struct otherwise.
    let (input_ty, args_struct, input_expr) = match params.as_slice() {
        [] => (quote! { () }, quote! {}, quote! { () }),
        [param] => {
            let ty = &param.ty;
            let ident = &param.ident;
            (quote! { #ty }, quote! {}, quote! { #ident })
        }
        _ => {
            let struct_name = format_ident!("{}Args", to_pascal_case(&fn_name.to_string()));
            let fields = params.iter().map(|p| {
                let ident = &p.ident;
                let ty = &p.ty;
                quote! { pub #ident: #ty }
            });
            let idents = params.iter().map(|p| &p.ident);
            (
                quote! { #struct_name },
                quote! {
                    #[derive(
                        ::opperai::__private::serde::Serialize,
                        ::opperai::__private::schemars::JsonSchema
                    )]
                    #[serde(crate = "::opperai::__private::serde")]
                    #[schemars(crate = "::opperai::__private::schemars")]
                    #vis struct #struct_name {
                        #(#fields,)*
                    }
                },
                quote! { #struct_name { #(#idents),* } },
            )
        }
    };

    let model = args.model.map(|model| quote! { .model(#model) });
    let description = args.description.map(|d| quote! { .description(#d) });

    let param_decls = params.iter().map(|p| {
        let ident = &p.ident;
        let ty = &p.ty;
        quote! { #ident: #ty }
    });

    let doc_attrs = input.attrs.iter().filter(|a| a.path().is_ident("doc"));

    let call_fn = if sig.asyncness.is_some() {
        quote! {
            #(#doc_attrs)*
            #vis async fn #fn_name(
                client: &::opperai::Opper,
                #(#param_decls),*
            ) -> ::std::result::Result<#output_ty, ::opperai::OpperError> {
                let __function = client.functions().ensure(&#definition_fn()).await?;
                let (__output, _) = __function.call(&#input_expr).await?;
                Ok(__output)
            }
        }
    } else {
        quote! {
            #(#doc_attrs)*
            #vis fn #fn_name(
                client: &::opperai::blocking::Opper,
                #(#param_decls),*
            ) -> ::std::result::Result<#output_ty, ::opperai::OpperError> {
                let __function = client.functions().ensure(&#definition_fn())?;
                let (__output, _) = __function.call(&#input_expr)?;
                Ok(__output)
            }
        }
    };

    Ok(quote! {
        #args_struct

        #[doc = concat!("Definition of the remote `", #remote_name, "` function.")]
        #vis fn #definition_fn() -> ::opperai::FunctionDefinition<#input_ty, #output_ty> {
            ::opperai::FunctionDefinition::new(#remote_name)
                .instructions(#instructions)
                #model
                #description
        }

        #call_fn
    })
}

fn parse_args(attr: TokenStream) -> Result<FunctionArgs> {
    if attr.is_empty() {
        return Ok(FunctionArgs::default());
    }
    let items = NestedMeta::parse_meta_list(attr)?;
    FunctionArgs::from_list(&items).map_err(|e| syn::Error::new(e.span(), e.to_string()))
}

fn split_visibility(item: TokenStream) -> Result<(Visibility, TokenStream)> {
    struct WithVis {
        attrs: Vec<Attribute>,
        vis: Visibility,
        rest: TokenStream,
    }

    impl syn::parse::Parse for WithVis {
        fn parse(input: syn::parse::ParseStream) -> Result<Self> {
            Ok(WithVis {
                attrs: input.call(Attribute::parse_outer)?,
                vis: input.parse()?,
                rest: input.parse()?,
            })
        }
    }

    let WithVis { attrs, vis, rest } = syn::parse2(item)?;
    Ok((vis, quote! { #(#attrs)* #rest }))
}

fn parse_params<'a>(inputs: impl Iterator<Item = &'a FnArg>) -> Result<Vec<Param>> {
    inputs
        .map(|arg| match arg {
            FnArg::Receiver(_) => Err(syn::Error::new_spanned(
                arg,
                "remote functions cannot take self",
            )),
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => Ok(Param {
                    ident: pat_ident.ident.clone(),
                    ty: (*pat_type.ty).clone(),
                }),
                _ => Err(syn::Error::new_spanned(
                    &pat_type.pat,
                    "only simple identifiers are supported for parameters",
                )),
            },
        })
        .collect()
}

fn extract_instructions(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc")
                && let syn::Meta::NameValue(meta) = &attr.meta
                && let syn::Expr::Lit(expr_lit) = &meta.value
                && let syn::Lit::Str(lit_str) = &expr_lit.lit
            {
                return Some(lit_str.value().trim().to_string());
            }
            None
        })
        .collect();

    let instructions = lines.join("\n").trim().to_string();
    (!instructions.is_empty()).then_some(instructions)
}

fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .map(|s| {
            let mut c = s.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
            }
        })
        .collect()
}
