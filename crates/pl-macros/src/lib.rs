use proc_macro::TokenStream;

mod protocol;
mod structs;

macro_rules! compile_err {
    ($at:expr, $err:literal) => {
        syn::Error::new_spanned($at, $err).into_compile_error().into()
    };
}

pub(crate) use compile_err;

/// Generate the preloader command envelope for a struct.
///
/// The struct gets `new()` taking every `echo` and `tx` field in declaration order, `run()` sending the
/// command byte and walking the fields in order, plus accessors for `getter` fields.
///
/// Struct attribute:
/// - `command = Variant` - `Command` variant sent (and echoed) before the fields
///
/// Field attributes:
/// - `echo` - big-endian field sent to the device, its echo is consumed and discarded
/// - `tx` - raw bytes sent without echo
/// - `rx` - big-endian field read from the device
///   - `status = N` - fail unless the value equals `N`
///   - `error = Variant` - `Error` variant used for the failed status, `DeviceStatus` by default
///   - `nonzero` - fail with `EmptyIdentity` if the value is zero
///   - `size = field` - `Vec<u8>` of `field` bytes, read in one go
///   - `getter` - generate accessor and `run_<field>()`
#[proc_macro_derive(Protocol, attributes(protocol))]
pub fn preloader_protocol(input: TokenStream) -> TokenStream {
    protocol::preloader_protocol(input)
}
