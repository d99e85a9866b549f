//! One validation pass: convert, check constraints, check key coverage.

use crate::constraints::Constraint;
use crate::core::{Config, ConfigSpecification};
use crate::error::ConfigError;
use std::thread;
use tracing::{debug, trace};

/// Below this many constraints per worker, threads cost more than they save.
const MIN_CONSTRAINTS_PER_WORKER: usize = 16;

/// Run conversion, constraint evaluation and (when `strict`) the key coverage
/// check, returning every error found in report order.
///
/// Errors already attached to `config` (load problems) come first, followed
/// by the specification's own errors, conversion failures, constraint errors
/// in canonical constraint order and finally the strict-mode error.
pub(crate) fn run(
    mut config: Config,
    specification: &ConfigSpecification,
    strict: bool,
    parallelism: usize,
) -> Vec<ConfigError> {
    let mut errors = config.take_errors();
    errors.extend(specification.errors().iter().cloned());

    specification.type_converter().convert(&mut config);
    errors.extend(config.take_errors());

    let constraint_errors = evaluate(&config, specification.constraints(), parallelism);
    debug!(
        constraints = specification.constraints().len(),
        failed = constraint_errors.len(),
        "Evaluated constraints"
    );
    errors.extend(constraint_errors);

    if strict && let Some(error) = keys_without_specification(&config, specification) {
        errors.push(error);
    }
    errors
}

/// Evaluate `constraints` against a converted, read-only `config`.
///
/// Work is split into contiguous chunks and results are concatenated in chunk
/// order, so the output matches sequential evaluation exactly.
pub(crate) fn evaluate(
    config: &Config,
    constraints: &[Box<dyn Constraint>],
    parallelism: usize,
) -> Vec<ConfigError> {
    let workers = parallelism
        .min(constraints.len() / MIN_CONSTRAINTS_PER_WORKER)
        .max(1);
    if workers == 1 {
        return evaluate_chunk(config, constraints);
    }

    let chunk_size = constraints.len().div_ceil(workers);
    trace!(workers, chunk_size, "Evaluating constraints in parallel");
    thread::scope(|scope| {
        let handles: Vec<_> = constraints
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || evaluate_chunk(config, chunk)))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(errors) => errors,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

fn evaluate_chunk(config: &Config, constraints: &[Box<dyn Constraint>]) -> Vec<ConfigError> {
    constraints
        .iter()
        .filter_map(|constraint| constraint.validate(config))
        .collect()
}

/// Config keys no constraint or conversion names literally.
fn keys_without_specification(
    config: &Config,
    specification: &ConfigSpecification,
) -> Option<ConfigError> {
    let covered = specification.covered_keys();
    let keys: Vec<String> = config
        .keys()
        .filter(|key| !covered.contains(key))
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        return None;
    }
    debug!(count = keys.len(), "Keys without specification");
    Some(ConfigError::KeysWithoutSpecification { keys })
}
