//! Parameter synthesis: one frozen stand-in per variable.

use tracing::trace;

use crate::expr::{Attribute, ParameterBuilder, ParameterData, VariableData};

/// Build one parameter per variable, sorted by id.
///
/// Callers pair this list with a sorted set of fixed ids, so the ordering is
/// part of the contract. Duplicate ids collapse to a single parameter.
pub fn synthesize(variables: impl IntoIterator<Item = VariableData>) -> Vec<ParameterData> {
    let mut variables: Vec<VariableData> = variables.into_iter().collect();
    variables.sort_by_key(|v| v.id);
    variables.dedup_by_key(|v| v.id);

    let mut parameters: Vec<ParameterData> = variables.iter().map(parameter_for).collect();
    parameters.sort_by_key(|p| p.id);
    parameters
}

/// Freeze a single variable at its current value.
///
/// The parameter keeps the variable's id, shape, name and attribute. A present
/// value is adjusted to satisfy the attribute: `|v|` for nonneg, `-|v|` for
/// nonpos, unchanged otherwise. An unset variable freezes to all zeros.
pub fn parameter_for(var: &VariableData) -> ParameterData {
    let value = var.value().map(|v| match var.attr {
        Attribute::Nonneg => v.abs(),
        Attribute::Nonpos => v.abs().neg(),
        Attribute::Psd | Attribute::Unconstrained => v,
    });
    let had_value = value.is_some();

    let mut builder = ParameterBuilder::new(var.shape.clone())
        .id(var.id)
        .name(var.name.clone())
        .attr(var.attr);
    if let Some(value) = value {
        builder = builder.value(value);
    }

    trace!(
        component = "fix",
        operation = "synthesize",
        status = "success",
        var_id = var.id.raw(),
        attr = ?var.attr,
        had_value,
        "Synthesized parameter"
    );
    builder.build_data()
}
