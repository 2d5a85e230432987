//! Derive macros for `bevy_snapshot`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{
    format_ident,
    quote,
};
use syn::{
    DeriveInput,
    LitStr,
    parse_macro_input,
};

fn bevy_snapshot_path() -> syn::Path {
    format_ident!("bevy_snapshot").into()
}

/// Converts a type identifier such as `PlayerHealth` into `player_health`.
fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, ch) in ident.char_indices() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// Derive macro generating an impl of the trait `NamedComponent`.
///
/// The registered name defaults to the snake case type name and can be set with
/// `#[snapshot(name = "...")]`.
#[proc_macro_derive(NamedComponent, attributes(snapshot))]
pub fn derive_named_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let mut name: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("snapshot")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported snapshot attribute, expected `name`"))
            }
        });

        if let Err(e) = parsed {
            return e.to_compile_error().into();
        }
    }

    let ident = &input.ident;
    let name = name
        .unwrap_or_else(|| LitStr::new(&snake_case(&ident.to_string()), Span::call_site()));

    if name.value().is_empty() {
        return syn::Error::new(name.span(), "component name must not be empty")
            .to_compile_error()
            .into();
    }

    let mut trait_path = bevy_snapshot_path();
    trait_path.segments.push(format_ident!("registry").into());
    trait_path.segments.push(format_ident!("NamedComponent").into());

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics #trait_path for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    }
    .into()
}
