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

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType};

/// Runs an `async fn` test on a fresh multi-threaded Tokio runtime.
///
/// The test body runs inside a `hub_test` tracing span. A panic raised on the
/// test thread itself is reported with its location; panics raised inside hub
/// worker tasks are left to the hubs, which turn them into failed deliveries.
/// Tests returning a `Result` are unwrapped.
#[proc_macro_attribute]
pub fn hub_test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;

    let async_name = syn::Ident::new(&format!("__{}_async", name), name.span());

    let finish = match output {
        ReturnType::Default => quote!(result),
        ReturnType::Type(..) => quote!(result.unwrap()),
    };

    let output = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            use std::panic;
            use std::sync::Arc;

            #[derive(Default)]
            struct PanicInfo {
                message: parking_lot::Mutex<Option<String>>,
                location: parking_lot::Mutex<Option<String>>,
            }

            let panic_info = Arc::new(PanicInfo::default());
            let panic_info_clone = Arc::clone(&panic_info);
            let test_thread = std::thread::current().id();

            let previous_hook = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if std::thread::current().id() == test_thread {
                    let payload = info.payload();
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned());
                    *panic_info_clone.message.lock() = message;
                    *panic_info_clone.location.lock() = info
                        .location()
                        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                }
                previous_hook(info);
            }));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();

            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                runtime.block_on(async {
                    let test_span = tracing::info_span!("hub_test", name = stringify!(#name));
                    let _enter = test_span.enter();
                    #async_name().await
                })
            }));

            let result = match outcome {
                Ok(result) => result,
                Err(_) => {
                    let location = panic_info
                        .location
                        .lock()
                        .clone()
                        .unwrap_or_else(|| "unknown location".to_string());
                    let message = panic_info
                        .message
                        .lock()
                        .clone()
                        .unwrap_or_else(|| "No error message".to_string())
                        .trim()
                        .replace('\n', " ");
                    tracing::error!("Panic: {}", message);
                    panic!("Panic at {}: {}", location, message);
                }
            };

            #finish
        }

        async fn #async_name(#inputs) #output #body
    };

    output.into()
}
