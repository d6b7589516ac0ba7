use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Builds `fn reduce(state: &Self, action) -> Loop<Self, Action>` for a state
/// struct out of one reducer per field.
///
/// ```ignore
/// #[derive(Clone, CombineReducers)]
/// #[combine(action = Msg)]
/// struct State {
///     #[reducer(counter::reduce)]
///     counter: counter::State,
///     #[reducer(todos::reduce)]
///     todos: todos::State,
///     title: String,
/// }
/// ```
///
/// Each `#[reducer(..)]` field is reduced with a clone of the action, fields
/// without one are cloned, and the field commands are merged in declaration
/// order. `#[combine(crate_path = ..)]` points at the core crate when it is
/// not reachable as `::reloop_core`.
#[proc_macro_derive(CombineReducers, attributes(combine, reducer))]
pub fn derive_combine_reducers(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct Options {
    action: syn::Type,
    krate: syn::Path,
}

fn options(input: &DeriveInput) -> syn::Result<Options> {
    let mut action = None;
    let mut krate = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("combine")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("action") {
                action = Some(meta.value()?.parse::<syn::Type>()?);
                Ok(())
            } else if meta.path.is_ident("crate_path") {
                krate = Some(meta.value()?.parse::<syn::Path>()?);
                Ok(())
            } else {
                Err(meta.error("expected `action` or `crate_path`"))
            }
        })?;
    }
    let action = action.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "CombineReducers needs `#[combine(action = YourAction)]`",
        )
    })?;
    Ok(Options {
        action,
        krate: krate.unwrap_or_else(|| syn::parse_quote!(::reloop_core)),
    })
}

fn reducer_of(field: &syn::Field) -> syn::Result<Option<syn::Expr>> {
    match field.attrs.iter().find(|a| a.path().is_ident("reducer")) {
        Some(attr) => attr.parse_args::<syn::Expr>().map(Some),
        None => Ok(None),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "CombineReducers needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "CombineReducers only supports structs",
            ))
        }
    };
    let Options { action, krate } = options(input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut steps = Vec::new();
    let mut inits = Vec::new();
    let mut reduced = 0usize;
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "unnamed field"))?;
        let ty = &field.ty;
        let local = format_ident!("__field_{}", ident);
        match reducer_of(field)? {
            Some(reducer) => {
                reduced += 1;
                steps.push(quote! {
                    let #local = {
                        let (next, cmd) = #krate::lift_state::<#ty, #action>(
                            (#reducer)(&state.#ident, ::std::clone::Clone::clone(&action)),
                        )
                        .into_parts();
                        cmds.push(cmd);
                        next
                    };
                });
            }
            None => steps.push(quote! {
                let #local = ::std::clone::Clone::clone(&state.#ident);
            }),
        }
        inits.push(quote! { #ident: #local });
    }
    let unused = if reduced == 0 {
        quote! { let _ = &action; }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn reduce(state: &Self, action: #action) -> #krate::Loop<Self, #action> {
                #[allow(unused_mut)]
                let mut cmds: ::std::vec::Vec<#krate::Cmd<#action>> = ::std::vec::Vec::new();
                #(#steps)*
                #unused
                #krate::loop_(Self { #(#inits),* }, #krate::merge(cmds))
            }
        }
    })
}
