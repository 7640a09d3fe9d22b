use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Marks a test function.
///
/// Synchronous functions become plain `#[test]`s. `async fn` tests run on a
/// current-thread tokio runtime, which is what single-threaded observables
/// (`Rc`-based, not `Send`) need when awaited.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(
        raw_args.span(),
        "rxlite_macro::test takes no arguments: every test runs on the current thread.",
      )
      .to_compile_error(),
    );
  }

  let test_attr = if input.sig.asyncness.is_some() {
    quote!(#[tokio::test(flavor = "current_thread")])
  } else {
    quote!(#[test])
  };

  let expanded = quote! {
      #test_attr
      #input
  };

  TokenStream::from(expanded)
}
