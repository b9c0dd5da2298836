use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

/// Replacement for `#[test]` that reports elapsed wall time and fails the
/// test when it exceeds a timeout (default: 1 second).
///
/// # Usage
/// ```ignore
/// use test_macros::timed_test;
///
/// #[timed_test]
/// fn fast_path() {
///     assert!(true);
/// }
///
/// #[timed_test(60)]
/// fn heavy_enumeration() {
///     // allowed up to 60 seconds
/// }
/// ```
#[proc_macro_attribute]
pub fn timed_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let limit_secs: u64 = if attr.is_empty() {
        1
    } else {
        parse_macro_input!(attr as LitInt)
            .base10_parse()
            .expect("timed_test takes an integer timeout in seconds")
    };

    let func = parse_macro_input!(item as ItemFn);
    let attrs = &func.attrs;
    let vis = &func.vis;
    let name = &func.sig.ident;
    let body = &func.block;

    let expanded = quote! {
        #(#attrs)*
        #[test]
        #vis fn #name() {
            let __started = ::std::time::Instant::now();
            let __outcome = ::std::panic::catch_unwind(
                ::std::panic::AssertUnwindSafe(|| #body),
            );
            let __secs = __started.elapsed().as_secs_f64();
            eprintln!("[timed] {} finished in {:.3}s", stringify!(#name), __secs);

            if let ::std::result::Result::Err(__payload) = __outcome {
                ::std::panic::resume_unwind(__payload);
            }
            assert!(
                __secs < #limit_secs as f64,
                "{} ran for {:.3}s (limit {}s)",
                stringify!(#name),
                __secs,
                #limit_secs,
            );
        }
    };

    expanded.into()
}
