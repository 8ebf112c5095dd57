//! Runtime: lower a `LogicalPlan` onto operators and run it.
//!
//! Plans are linear chains, so lowering walks from the `Scan` up and emits
//! one operator per node. Every operator is planned against its input
//! schema before anything is evaluated, so a bad column fails without doing
//! any work.

use std::sync::Arc;

use tabkit_core::dag::LogicalPlan;
use tabkit_core::table::Table;
use tabkit_operators::{Aggregate, Filter, Limit, Operator, Project, Sort};
use tracing::{debug, debug_span, trace};

use crate::error::Result;

/// Operators for every node above the `Scan`, in execution order.
pub fn lower(plan: &LogicalPlan, partition_rows: usize) -> Vec<Box<dyn Operator>> {
    let mut chain = Vec::new();
    let mut node = Some(plan);
    while let Some(n) = node {
        chain.push(n);
        node = n.input();
    }

    chain
        .into_iter()
        .rev()
        .filter_map(|n| -> Option<Box<dyn Operator>> {
            match n {
                LogicalPlan::Scan { .. } => None,
                LogicalPlan::Filter { predicate, .. } => {
                    Some(Box::new(Filter::new(predicate.clone(), partition_rows)))
                }
                LogicalPlan::Project { items, .. } => Some(Box::new(Project::new(items.clone()))),
                LogicalPlan::Aggregate { group_by, aggs, .. } => Some(Box::new(Aggregate::new(
                    group_by.clone(),
                    aggs.clone(),
                    partition_rows,
                ))),
                LogicalPlan::Sort { keys, .. } => Some(Box::new(Sort::new(keys.clone()))),
                LogicalPlan::Limit { n, .. } => Some(Box::new(Limit { n: *n })),
            }
        })
        .collect()
}

/// Run `plan` over `source`, the table its `Scan` names.
pub fn execute(plan: &LogicalPlan, source: Arc<Table>, partition_rows: usize) -> Result<Arc<Table>> {
    let ops = lower(plan, partition_rows);

    let mut schema = source.schema().clone();
    for op in &ops {
        schema = op.plan(&schema)?;
    }
    debug!(view = plan.source_view(), operators = ops.len(), "plan validated");

    let mut current = source;
    for op in &ops {
        let _span = debug_span!("operator", name = op.name()).entered();
        let out = op.eval(&current)?;
        trace!(rows_in = current.num_rows(), rows_out = out.num_rows(), "operator done");
        current = Arc::new(out);
    }
    Ok(current)
}
