//! Signature processing.
//!
//! Parameters and results go through the same element rule as every other
//! type position: pointer chains fold to a single depth-carrying pointer.
//! Variadic is recorded only on the final parameter. The canonical
//! `structure` string is the printer's package-path-qualified rendering.

use tracing::warn;

use tyscan_catalog::{FuncData, Param};
use tyscan_front::{ParamDesc, TypeDesc, Ty};

use crate::resolve::Resolver;

/// Build `FuncData` from a signature descriptor. Returns `None` when the
/// descriptor is not a signature or a parameter type fails to resolve.
pub fn process_signature(resolver: &Resolver<'_>, sig: Ty) -> Option<FuncData> {
    let Some(TypeDesc::Signature {
        params,
        results,
        variadic,
        ..
    }) = resolver.export.table.get(sig)
    else {
        warn!(?sig, "expected a signature descriptor");
        return None;
    };

    let last = params.len().saturating_sub(1);
    let mut out_params = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        out_params.push(process_param(resolver, param, *variadic && index == last)?);
    }

    let mut out_results = Vec::with_capacity(results.len());
    for result in results {
        out_results.push(process_param(resolver, result, false)?);
    }

    Some(FuncData {
        params: out_params,
        results: out_results,
        variadic: *variadic,
        structure: resolver.printer().print(sig),
        receiver: None,
        pointer_receiver: false,
        promoted_from: None,
    })
}

fn process_param(resolver: &Resolver<'_>, param: &ParamDesc, variadic: bool) -> Option<Param> {
    let ty = resolver.resolve_element(param.ty)?;
    Some(Param {
        name: param.name.clone(),
        ty,
        variadic,
    })
}
