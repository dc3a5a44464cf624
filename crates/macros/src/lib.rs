/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Fields, ItemEnum, ItemStruct};

/// Generates an `inner()` accessor for single-field tuple structs (newtypes).
#[proc_macro_attribute]
pub fn impl_getter(_: TokenStream, input: TokenStream) -> TokenStream {
    let input_struct = parse_macro_input!(input as ItemStruct);
    let struct_name = &input_struct.ident;

    let inner_type = match &input_struct.fields {
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
        _ => {
            return syn::Error::new_spanned(
                &input_struct.ident,
                "impl_getter expects a tuple struct with exactly one field",
            )
            .to_compile_error()
            .into()
        }
    };

    let expanded = quote! {
        #input_struct

        impl #struct_name {
            pub fn inner(&self) -> #inner_type {
                self.0.to_owned()
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_attribute]
pub fn add_error(_: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemEnum);
    let enum_name = &input.ident;

    let variants = input.variants.iter().map(|variant| {
        let variant_screaming_snake_case = convert_to_snake_case(variant.ident.to_string());
        quote! {
            #[error(#variant_screaming_snake_case)]
            #variant,
        }
    });

    let expanded = quote! {
        #[derive(Debug, Serialize, thiserror::Error)]
        pub enum #enum_name {
            #(#variants)*
        }
    };

    TokenStream::from(expanded)
}

fn convert_to_snake_case(input: String) -> String {
    let mut result = String::new();
    let mut last_char_was_upper = false;

    for c in input.chars() {
        if c.is_uppercase() {
            if !last_char_was_upper && !result.is_empty() {
                result.push('_');
            }
            result.push(c.to_ascii_uppercase());
            last_char_was_upper = true;
        } else {
            result.push(c.to_ascii_uppercase());
            last_char_was_upper = false;
        }
    }

    result
}
