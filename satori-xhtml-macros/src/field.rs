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

//! Field attribute parsing
//!
//! Reads `#[attr(..)]` and the subset of `#[serde(..)]` that affects how a
//! field is looked up. Unknown serde options are ignored so the same struct
//! can also derive serde traits.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{Data, DeriveInput, Fields, LitStr, Member, Token, Type, Visibility, meta::ParseNestedMeta};

pub struct BoundField {
    pub member: Member,
    /// Field name, or the `#[attr(name)]` of a tuple field
    pub name: String,
    pub ty: Type,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub optional: bool,
    pub skip: bool,
    /// `#[serde(skip)]` only drops the serde name
    serde_skip: bool,
}

impl BoundField {
    pub fn ty_name(&self) -> String {
        self.ty.to_token_stream().to_string().replace(' ', "")
    }

    /// Aliases a record answers to besides its field name, the serde key
    /// before the `#[attr(name)]`.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        [self.secondary.as_deref(), self.primary.as_deref()].into_iter().flatten()
    }
}

fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream = content.parse()?;
    }
    Ok(())
}

fn parse_attr(meta: ParseNestedMeta, field: &mut BoundField) -> syn::Result<()> {
    if meta.path.is_ident("name") {
        let name: LitStr = meta.value()?.parse()?;
        field.primary = Some(name.value());
    } else if meta.path.is_ident("omitempty") {
        field.optional = true;
    } else if meta.path.is_ident("skip") {
        field.skip = true;
    } else {
        return Err(meta.error("expected `name`, `omitempty` or `skip`"));
    }
    Ok(())
}

fn parse_serde(meta: ParseNestedMeta, field: &mut BoundField) -> syn::Result<()> {
    if meta.path.is_ident("rename") {
        if meta.input.peek(Token![=]) {
            let name: LitStr = meta.value()?.parse()?;
            field.secondary = Some(name.value());
            return Ok(());
        }
        return meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("deserialize") {
                let name: LitStr = inner.value()?.parse()?;
                field.secondary = Some(name.value());
                Ok(())
            } else {
                skip_value(&inner)
            }
        });
    }
    if meta.path.is_ident("default") {
        field.optional = true;
    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
        field.serde_skip = true;
    }
    skip_value(&meta)
}

/// Collects the fields of a struct with their lookup settings. Only `pub`
/// named fields and named tuple fields take part.
pub fn collect(input: &DeriveInput, derive: &str) -> syn::Result<Vec<BoundField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be derived for structs"),
        ));
    };

    let fields: Vec<&syn::Field> = match &data.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unnamed(unnamed) => unnamed.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    };

    let mut out = Vec::with_capacity(fields.len());
    for (index, field) in fields.into_iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        };
        let mut bound = BoundField {
            name: field.ident.as_ref().map(|i| i.to_string()).unwrap_or_default(),
            member,
            ty: field.ty.clone(),
            primary: None,
            secondary: None,
            optional: false,
            skip: false,
            serde_skip: false,
        };
        for attr in &field.attrs {
            if attr.path().is_ident("attr") {
                attr.parse_nested_meta(|meta| parse_attr(meta, &mut bound))?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| parse_serde(meta, &mut bound))?;
            }
        }
        if bound.serde_skip {
            bound.secondary = None;
        }
        if let Some(raw) = bound.name.strip_prefix("r#").map(str::to_string) {
            bound.name = raw;
        }
        if field.ident.is_some() && !matches!(field.vis, Visibility::Public(_)) {
            bound.skip = true;
        }
        // tuple fields only take part when they are given a name
        if bound.name.is_empty() {
            match bound.primary.take() {
                Some(name) => bound.name = name,
                None => bound.skip = true,
            }
        }
        out.push(bound);
    }
    Ok(out)
}
