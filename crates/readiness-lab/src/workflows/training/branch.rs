use tracing::warn;

use super::document::{BranchOptions, DecisionPointSpec, OptionSpec, ScenarioDocument};

/// Resolve the option sequence visible at a decision point, given the option
/// locked at the preceding one.
///
/// Keyed specs fall back from the matching branch to the `default` branch to
/// the union of every branch in authoring order. Incomplete branch authoring
/// therefore degrades to "show everything" instead of an empty screen; an
/// empty result is only possible when the document defines no options at all
/// for the stage, which is an authoring defect, not a runtime error.
pub fn resolve_options(spec: &DecisionPointSpec, prior_option_id: Option<&str>) -> Vec<OptionSpec> {
    let resolved = match &spec.options {
        BranchOptions::Flat(options) => options.clone(),
        BranchOptions::Keyed { branches, default } => {
            let keyed = prior_option_id
                .and_then(|prior| branches.get(prior))
                .filter(|branch| !branch.is_empty());

            match keyed {
                Some(branch) => branch.clone(),
                None => match default.as_ref().filter(|branch| !branch.is_empty()) {
                    Some(branch) => branch.clone(),
                    None => branches.values().flatten().cloned().collect(),
                },
            }
        }
    };

    if resolved.is_empty() {
        warn!(
            decision_point = spec.index,
            "decision point resolves to zero options; content needs attention"
        );
    }

    resolved
}

/// Look up the option a locked decision refers to. `None` means the id no
/// longer resolves against the document; scoring degrades to defaults.
pub fn find_option(
    document: &ScenarioDocument,
    index: u8,
    prior_option_id: Option<&str>,
    option_id: &str,
) -> Option<OptionSpec> {
    let spec = document.decision_point(index)?;
    resolve_options(spec, prior_option_id)
        .into_iter()
        .find(|option| option.id == option_id)
}
