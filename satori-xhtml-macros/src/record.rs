// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::field::collect;

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = collect(input, "Record")?;
    let ident = &input.ident;
    let shape = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let readable: Vec<_> = fields.iter().filter(|f| !f.skip).collect();

    // field names win over aliases, later duplicates are unreachable
    let mut seen = HashSet::new();
    let mut arms = Vec::new();
    let by_name = readable.iter().map(|f| (f.name.as_str(), &f.member));
    let by_alias = readable.iter().flat_map(|f| {
        let member = &f.member;
        f.aliases().map(move |alias| (alias, member))
    });
    for (key, member) in by_name.chain(by_alias) {
        if seen.insert(key.to_string()) {
            arms.push(quote! {
                #key => ::std::option::Option::Some(::satori_xhtml::ToValue::to_value(&self.#member)),
            });
        }
    }

    let inserts = readable.iter().map(|f| {
        let name = &f.name;
        let member = &f.member;
        quote! {
            map.insert(::std::string::String::from(#name), ::satori_xhtml::ToValue::to_value(&self.#member));
        }
    });

    Ok(quote! {
        impl #impl_generics ::satori_xhtml::Record for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #shape
            }

            fn field(&self, name: &str) -> ::std::option::Option<::satori_xhtml::Value> {
                match name {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn to_map(&self) -> ::satori_xhtml::Map {
                let mut map = ::satori_xhtml::Map::new();
                #(#inserts)*
                map
            }
        }

        impl #impl_generics ::satori_xhtml::ToValue for #ident #ty_generics #where_clause {
            fn to_value(&self) -> ::satori_xhtml::Value {
                ::satori_xhtml::Value::Map(::satori_xhtml::Record::to_map(self))
            }
        }
    })
}
