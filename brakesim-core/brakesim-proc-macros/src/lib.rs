mod imports;
use crate::imports::*;
mod approx_eq_derive;
mod history_vec_derive;
mod utilities;

/// Generates a `<Name>HistoryVec` struct-of-vecs for recording a `Copy` state struct
/// once per saved time step.
#[proc_macro_error]
#[proc_macro_derive(HistoryVec)]
pub fn history_vec_derive(input: TokenStream) -> TokenStream {
    history_vec_derive::history_vec_derive(input)
}

/// Field-wise implementation of `ApproxEq`
#[proc_macro_error]
#[proc_macro_derive(ApproxEq)]
pub fn approx_eq_derive(input: TokenStream) -> TokenStream {
    approx_eq_derive::approx_eq_derive(input)
}
