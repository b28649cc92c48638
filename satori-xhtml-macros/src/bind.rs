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

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::field::{BoundField, collect};

fn opt_str(value: &Option<String>) -> TokenStream {
    match value {
        Some(s) => quote!(::std::option::Option::Some(#s)),
        None => quote!(::std::option::Option::None),
    }
}

fn field_spec(field: &BoundField) -> TokenStream {
    let name = &field.name;
    let primary = opt_str(&field.primary);
    let secondary = opt_str(&field.secondary);
    let optional = field.optional;
    let ty = field.ty_name();
    quote! {
        ::satori_xhtml::bind::FieldSpec {
            name: #name,
            primary: #primary,
            secondary: #secondary,
            optional: #optional,
            ty: #ty,
        }
    }
}

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = collect(input, "Bind")?;
    let ident = &input.ident;
    let shape = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let bound: Vec<&BoundField> = fields.iter().filter(|f| !f.skip).collect();
    let specs = bound.iter().map(|f| field_spec(f));

    let mut inits = Vec::with_capacity(fields.len());
    let mut index = 0usize;
    for field in &fields {
        let member = &field.member;
        let ty = &field.ty;
        let init = if field.skip {
            quote!(::std::default::Default::default())
        } else if field.optional {
            quote!(plan.optional::<#ty>(#index, attrs)?.unwrap_or_default())
        } else {
            quote!(plan.require::<#ty>(#index, attrs)?)
        };
        if !field.skip {
            index += 1;
        }
        inits.push(quote!(#member: #init));
    }

    // every field is converted before any is written
    let temps: Vec<_> = (0..bound.len()).map(|i| quote::format_ident!("__field{}", i)).collect();
    let reads = bound.iter().enumerate().zip(&temps).map(|((i, field), temp)| {
        let ty = &field.ty;
        if field.optional {
            quote!(let #temp = plan.optional::<#ty>(#i, attrs)?;)
        } else {
            quote!(let #temp = ::std::option::Option::Some(plan.require::<#ty>(#i, attrs)?);)
        }
    });
    let writes = bound.iter().zip(&temps).map(|(field, temp)| {
        let member = &field.member;
        quote! {
            if let ::std::option::Option::Some(value) = #temp {
                self.#member = value;
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::satori_xhtml::bind::Bind for #ident #ty_generics #where_clause {
            const SHAPE: &'static str = #shape;
            const FIELDS: &'static [::satori_xhtml::bind::FieldSpec] = &[#(#specs),*];

            fn from_plan(
                plan: &::satori_xhtml::bind::BindingPlan,
                attrs: &::satori_xhtml::Map,
            ) -> ::std::result::Result<Self, ::satori_xhtml::BindError> {
                let _ = (plan, attrs);
                ::std::result::Result::Ok(Self { #(#inits,)* })
            }

            fn merge_plan(
                &mut self,
                plan: &::satori_xhtml::bind::BindingPlan,
                attrs: &::satori_xhtml::Map,
            ) -> ::std::result::Result<(), ::satori_xhtml::BindError> {
                let _ = (plan, attrs);
                #(#reads)*
                #(#writes)*
                ::std::result::Result::Ok(())
            }
        }

        impl #impl_generics ::satori_xhtml::bind::FromValue for #ident #ty_generics #where_clause {
            fn from_value(
                value: &::satori_xhtml::Value,
            ) -> ::std::result::Result<Self, ::satori_xhtml::ConvertError> {
                ::satori_xhtml::bind::from_record_value(value)
            }
        }
    })
}
