/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Hub Macro Library
//!
//! Procedural macros for declaring message types exchanged between hubs.
//!
//! ```ignore
//! // Fire-and-forget message
//! #[hub_message]
//! pub struct Tick;
//!
//! // Request whose correlated response is `Pong`
//! #[hub_message(response = Pong)]
//! pub struct Ping;
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput, Type};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options parsed from `#[hub_message(...)]`.
#[derive(Default)]
struct MessageConfig {
    /// Response type; when present the message is a request.
    response: Option<Type>,
}

/// Declares a hub message type.
///
/// Expands to:
/// - `#[derive(Clone, Debug)]` (only the traits not already derived)
/// - a compile-time assertion that the type is `Send + Sync + 'static`
/// - with `response = T`, an implementation of `message_hub::Request`
///   binding the request to its response type, so it can be used with
///   `Hub::await_response`.
///
/// ```ignore
/// use message_hub::prelude::*;
///
/// #[hub_message]
/// pub struct Pong;
///
/// #[hub_message(response = Pong)]
/// pub struct Ping;
/// ```
#[proc_macro_attribute]
pub fn hub_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut config = MessageConfig::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("response") {
            config.response = Some(meta.value()?.parse::<Type>()?);
            Ok(())
        } else {
            Err(meta.error("unsupported hub_message option, expected `response = Type`"))
        }
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let request_impl = config.response.as_ref().map(|response| {
        quote! {
            impl #impl_generics ::message_hub::Request for #name #ty_generics #where_clause {
                type Response = #response;
            }
        }
    });

    let assert_ident = quote::format_ident!("_AssertHubMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        #request_impl

        // Messages cross task boundaries inside shared envelopes.
        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
