use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

/// Derives the `FromRng` trait.
///
/// Every field is generated in declaration order by calling `FromRng::from_rng` on the same
/// random number generator, so the result only depends on the generator's state.
#[proc_macro_derive(FromRng)]
pub fn derive_from_rng(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(ret) => ret.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "`FromRng` can only be derived for structs",
        ));
    };

    let body = match &data.fields {
        Fields::Named(fields) => {
            let init = fields.named.iter().map(|field| {
                let ident = &field.ident;
                quote! { #ident: ::ec_rng::FromRng::from_rng(rng), }
            });
            quote! { Self { #(#init)* } }
        }
        Fields::Unnamed(fields) => {
            let init = fields
                .unnamed
                .iter()
                .map(|_| quote! { ::ec_rng::FromRng::from_rng(rng), });
            quote! { Self(#(#init)*) }
        }
        Fields::Unit => quote! { Self },
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::ec_rng::FromRng for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn from_rng(rng: &mut impl ::ec_rng::Rng) -> Self {
                #body
            }
        }
    })
}
