use darling::{FromDeriveInput, FromField};
use derive_more::IsVariant;
use syn::{Ident, Type};

macro_rules! count_some {
    ($($opt:expr),+ $(,)?) => {{
        let mut n = 0;
        $(
            if matches!($opt, Some(_)) {
                n += 1;
            }
        )+
        n
    }};
}

macro_rules! err {
    ($at:expr, $msg:literal) => {{
        Err(syn::Error::new_spanned($at, $msg))
    }};
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(protocol), supports(struct_named))]
pub(crate) struct DarlingProtocolArgs {
    /// `Command` variant
    pub command: Ident,
}

#[derive(Debug, FromField)]
#[darling(attributes(protocol))]
pub(crate) struct DarlingProtocolField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    tx: Option<()>,
    #[darling(default)]
    rx: Option<()>,
    #[darling(default)]
    echo: Option<()>,
    #[darling(default)]
    status: Option<u16>,
    #[darling(default)]
    error: Option<Ident>,
    #[darling(default)]
    nonzero: Option<()>,
    #[darling(default)]
    size: Option<Ident>,
    #[darling(default)]
    getter: Option<()>,
}

pub(crate) enum RxType {
    /// Expected value and `Error` variant to fail with
    Status(u16, Option<Ident>),
    /// Must not be zero
    NonZero,
    /// Number of elements is stored in another field
    Size(Ident),
    None,
}

#[derive(IsVariant)]
pub(crate) enum FieldType {
    Tx,
    Rx { ty: RxType, getter: bool },
    Echo,
}

pub(crate) struct ProtocolField {
    pub ident: Ident,
    pub ty: Type,
    pub kind: FieldType,
}

impl TryFrom<DarlingProtocolField> for ProtocolField {
    type Error = syn::Error;

    fn try_from(value: DarlingProtocolField) -> Result<Self, Self::Error> {
        let Some(ident) = value.ident else {
            return err!(&value.ty, "only named fields are supported");
        };

        if count_some!(value.tx, value.rx, value.echo) != 1 {
            return err!(&ident, "field must be exactly one of tx, rx or echo");
        }

        if value.rx.is_none() {
            if value.status.is_some() || value.error.is_some() || value.nonzero.is_some() {
                return err!(&ident, "only rx field can be a status");
            } else if value.size.is_some() {
                return err!(&ident, "only rx field can have size");
            } else if value.getter.is_some() {
                return err!(&ident, "only rx field can have getter");
            }
        }

        if count_some!(value.status, value.nonzero, value.size) > 1 {
            return err!(&ident, "status, nonzero and size are mutually exclusive");
        }
        if value.error.is_some() && value.status.is_none() {
            return err!(&ident, "error requires status");
        }

        let kind = if value.tx.is_some() {
            FieldType::Tx
        } else if value.echo.is_some() {
            FieldType::Echo
        } else {
            let ty = if let Some(expected) = value.status {
                RxType::Status(expected, value.error)
            } else if value.nonzero.is_some() {
                RxType::NonZero
            } else if let Some(size) = value.size {
                RxType::Size(size)
            } else {
                RxType::None
            };

            FieldType::Rx {
                ty,
                getter: value.getter.is_some(),
            }
        };

        Ok(Self {
            ident,
            ty: value.ty,
            kind,
        })
    }
}
