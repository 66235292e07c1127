use proc_macro::TokenStream;
use quote::quote;

/// Derives `util::EnumFromStr` (and `std::str::FromStr`) for a fieldless
/// enum. Matching ignores ASCII case: assembly sources write mnemonics in
/// lower case while the variants are upper case.
#[proc_macro_derive(EnumFromStr)]
pub fn enum_from_str_derive(input: TokenStream) -> TokenStream {
    let item: syn::DeriveInput = syn::parse(input).unwrap();
    let name = &item.ident;
    let name_str = name.to_string();

    let variants = match &item.data {
        syn::Data::Enum(data) => &data.variants,
        _ => panic!("EnumFromStr can only be derived for enums."),
    };
    assert!(
        variants.iter().all(|v| v.fields.is_empty()),
        "EnumFromStr requires fieldless variants."
    );

    let literals: Vec<String> = variants
        .iter()
        .map(|v| v.ident.to_string().to_ascii_uppercase())
        .collect();
    let idents: Vec<&syn::Ident> = variants.iter().map(|v| &v.ident).collect();

    let expanded = quote! {
        impl EnumFromStr for #name {
            fn from_str(s: &str) -> Result<#name, ::util::ParseEnumError> {
                match s.to_ascii_uppercase().as_str() {
                    #( #literals => Ok(#name::#idents), )*
                    _ => Err(::util::ParseEnumError {
                        value: s.to_string(),
                        enum_name: #name_str,
                    }),
                }
            }
        }

        impl ::core::str::FromStr for #name {
            type Err = ::util::ParseEnumError;

            fn from_str(s: &str) -> Result<#name, ::util::ParseEnumError> {
                EnumFromStr::from_str(s)
            }
        }
    };

    expanded.into()
}
