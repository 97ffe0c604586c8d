use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr, Token, parse_macro_input};

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    serde_rename: Option<String>,
    sort: bool,
    index: bool,
    required: bool,
    facet: bool,
    type_override: Option<String>,
    default_sort: bool,
    flatten: bool,
    skip: bool,
    epoch_seconds: bool,
}

impl FieldAttrs {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();

        for attr in &field.attrs {
            if attr.path().is_ident("tsense") {
                attr.parse_nested_meta(|meta| {
                    let key = meta
                        .path
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default();
                    match key.as_str() {
                        "rename" => attrs.rename = Some(meta.value()?.parse::<LitStr>()?.value()),
                        "type_override" => {
                            attrs.type_override = Some(meta.value()?.parse::<LitStr>()?.value())
                        }
                        "sort" => attrs.sort = true,
                        "index" => attrs.index = true,
                        "required" => attrs.required = true,
                        "facet" => attrs.facet = true,
                        "default_sort" => attrs.default_sort = true,
                        "flatten" => attrs.flatten = true,
                        "skip" => attrs.skip = true,
                        _ => return Err(meta.error(format!("unknown tsense key `{key}`"))),
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                        attrs.serde_rename = Some(meta.value()?.parse::<LitStr>()?.value());
                    } else if (meta.path.is_ident("with") || meta.path.is_ident("serialize_with"))
                        && meta.input.peek(Token![=])
                    {
                        let path = meta.value()?.parse::<LitStr>()?.value();
                        attrs.epoch_seconds = is_chrono_timestamp(&path);
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing")
                    {
                        attrs.skip = true;
                    } else {
                        skip_meta_value(&meta)?;
                    }
                    Ok(())
                })?;
            }
        }

        Ok(attrs)
    }
}

// `chrono::serde::ts_seconds` and its siblings write an integer.
fn is_chrono_timestamp(path: &str) -> bool {
    path.rsplit("::")
        .next()
        .is_some_and(|module| module.starts_with("ts_"))
}

// Consume whatever follows a serde key this macro does not interpret.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta_value(&inner))?;
    }
    Ok(())
}

fn field_tokens(field: &Field) -> syn::Result<Option<TokenStream2>> {
    let attrs = FieldAttrs::parse(field)?;
    if attrs.skip {
        return Ok(None);
    }

    let ty = &field.ty;
    if attrs.flatten {
        return Ok(Some(quote! {
            fields.extend(<#ty as ::tsense::Describe>::fields());
        }));
    }

    let Some(ident) = &field.ident else {
        return Err(syn::Error::new_spanned(field, "Describe needs named fields"));
    };
    let name = attrs
        .rename
        .or(attrs.serde_rename)
        .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
    let kind = if attrs.epoch_seconds {
        quote!(::tsense::DeclaredKind::DateTime)
    } else {
        let declared = quote!(#ty).to_string();
        quote!(::tsense::DeclaredKind::from_rust_type(#declared))
    };

    let mut builder = quote! {
        ::tsense::FieldDescriptor::new(#name, #kind)
    };
    if attrs.sort {
        builder = quote!(#builder.sort());
    }
    if attrs.index {
        builder = quote!(#builder.index());
    }
    if attrs.required {
        builder = quote!(#builder.required());
    }
    if attrs.facet {
        builder = quote!(#builder.facet());
    }
    if let Some(remote) = attrs.type_override {
        builder = quote!(#builder.type_override(#remote));
    }
    if attrs.default_sort {
        builder = quote!(#builder.default_sort());
    }

    Ok(Some(quote! {
        fields.push(#builder);
    }))
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Describe can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            name,
            "Describe needs a struct with named fields",
        ));
    };

    let mut pushes = Vec::new();
    for field in &named.named {
        if let Some(tokens) = field_tokens(field)? {
            pushes.push(tokens);
        }
    }
    let type_name = name.to_string();

    Ok(quote! {
        impl #impl_generics ::tsense::Describe for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn fields() -> ::std::vec::Vec<::tsense::FieldDescriptor> {
                let mut fields = ::std::vec::Vec::new();
                #(#pushes)*
                fields
            }
        }
    })
}

pub fn describe_derive_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}
