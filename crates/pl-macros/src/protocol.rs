use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use crate::{
    compile_err,
    structs::{DarlingProtocolArgs, DarlingProtocolField, FieldType, ProtocolField, RxType},
};

pub fn preloader_protocol(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let args = match DarlingProtocolArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };

    let name = &input.ident;
    let named = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(f) => &f.named,
            _ => return compile_err!(name, "expected named fields"),
        },
        _ => return compile_err!(name, "expected struct"),
    };

    let mut fields = Vec::with_capacity(named.len());
    for field in named {
        let field = match DarlingProtocolField::from_field(field) {
            Ok(field) => field,
            Err(e) => return e.write_errors().into(),
        };
        match ProtocolField::try_from(field) {
            Ok(field) => fields.push(field),
            Err(e) => return e.into_compile_error().into(),
        }
    }

    let command = &args.command;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let ctor = fields
        .iter()
        .filter(|f| f.kind.is_tx() || f.kind.is_echo())
        .collect::<Vec<_>>();
    let ctor_idents = ctor.iter().map(|f| &f.ident).collect::<Vec<_>>();
    let ctor_tys = ctor.iter().map(|f| &f.ty).collect::<Vec<_>>();

    let steps = fields.iter().map(step).collect::<Vec<_>>();
    let getters = fields.iter().filter_map(getter).collect::<Vec<_>>();

    TokenStream::from(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub const COMMAND: Command = Command::#command;

            pub fn new(#(#ctor_idents: #ctor_tys),*) -> Self {
                Self {
                    #(#ctor_idents,)*
                    ..::core::default::Default::default()
                }
            }

            pub fn run<P: ::pl_port::Transport>(&mut self, port: &mut P) -> ::core::result::Result<(), Error> {
                ::pl_port::Transport::echo(port, Self::COMMAND as u8)?;
                #(#steps)*
                Ok(())
            }

            #(#getters)*
        }
    })
}

fn step(field: &ProtocolField) -> TokenStream2 {
    let ident = &field.ident;
    match &field.kind {
        FieldType::Echo => quote! {
            ::pl_port::Transport::echo(port, self.#ident)?;
        },
        FieldType::Tx => quote! {
            ::pl_port::SimpleWrite::write(port, &self.#ident[..])?;
        },
        FieldType::Rx { ty, .. } => match ty {
            RxType::None => quote! {
                self.#ident = ::pl_port::SimpleRead::read_be(port)?;
            },
            RxType::Status(expected, error) => {
                let expected = Literal::u16_unsuffixed(*expected);
                let fail = match error {
                    Some(variant) => quote! { Error::#variant(self.#ident) },
                    None => quote! { Error::DeviceStatus(Self::COMMAND, self.#ident) },
                };
                quote! {
                    self.#ident = ::pl_port::SimpleRead::read_be(port)?;
                    if self.#ident != #expected {
                        return Err(#fail);
                    }
                }
            }
            RxType::NonZero => quote! {
                self.#ident = ::pl_port::SimpleRead::read_be(port)?;
                if self.#ident == 0 {
                    return Err(Error::EmptyIdentity(Self::COMMAND));
                }
            },
            RxType::Size(size) => quote! {
                self.#ident = ::std::vec![0; self.#size as usize];
                ::pl_port::SimpleRead::read(port, &mut self.#ident[..])?;
            },
        },
    }
}

fn getter(field: &ProtocolField) -> Option<TokenStream2> {
    if !matches!(field.kind, FieldType::Rx { getter: true, .. }) {
        return None;
    }

    let ident = &field.ident;
    let ty = &field.ty;
    let run = format_ident!("run_{}", ident);
    Some(quote! {
        pub fn #ident(&self) -> &#ty {
            &self.#ident
        }

        pub fn #run<P: ::pl_port::Transport>(&mut self, port: &mut P) -> ::core::result::Result<#ty, Error> {
            self.run(port)?;
            Ok(::core::clone::Clone::clone(&self.#ident))
        }
    })
}
