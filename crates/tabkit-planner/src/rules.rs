//! Lightweight logical rewrites.

use tabkit_core::dag::LogicalPlan;

/// Apply every rewrite bottom-up.
pub fn optimize(plan: LogicalPlan) -> LogicalPlan {
    rewrite(plan)
}

fn rewrite(plan: LogicalPlan) -> LogicalPlan {
    use LogicalPlan::*;

    match plan {
        Scan { .. } => plan,
        Filter { input, predicate } => merge_filters(rewrite(*input), predicate),
        Limit { input, n } => collapse_limits(rewrite(*input), n),
        Project { input, items } => Project {
            input: Box::new(rewrite(*input)),
            items,
        },
        Aggregate {
            input,
            group_by,
            aggs,
        } => Aggregate {
            input: Box::new(rewrite(*input)),
            group_by,
            aggs,
        },
        Sort { input, keys } => Sort {
            input: Box::new(rewrite(*input)),
            keys,
        },
    }
}

/// `Filter(Filter(x, p), q)` → `Filter(x, p AND q)`.
fn merge_filters(input: LogicalPlan, predicate: tabkit_core::expr::Expr) -> LogicalPlan {
    match input {
        LogicalPlan::Filter {
            input: inner,
            predicate: p,
        } => LogicalPlan::Filter {
            input: inner,
            predicate: p.and(predicate),
        },
        other => LogicalPlan::Filter {
            input: Box::new(other),
            predicate,
        },
    }
}

/// `Limit(Limit(x, a), b)` → `Limit(x, min(a, b))`.
fn collapse_limits(input: LogicalPlan, n: usize) -> LogicalPlan {
    match input {
        LogicalPlan::Limit { input: inner, n: m } => LogicalPlan::Limit {
            input: inner,
            n: n.min(m),
        },
        other => LogicalPlan::Limit {
            input: Box::new(other),
            n,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkit_core::expr::{col, lit};

    fn scan() -> Box<LogicalPlan> {
        Box::new(LogicalPlan::Scan { view: "t".into() })
    }

    #[test]
    fn stacked_filters_merge() {
        let plan = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Filter {
                input: Box::new(LogicalPlan::Filter {
                    input: scan(),
                    predicate: col("a").eq(lit(1)),
                }),
                predicate: col("b").eq(lit(2)),
            }),
            predicate: col("c").eq(lit(3)),
        };
        let want = LogicalPlan::Filter {
            input: scan(),
            predicate: col("a")
                .eq(lit(1))
                .and(col("b").eq(lit(2)))
                .and(col("c").eq(lit(3))),
        };
        assert_eq!(optimize(plan), want);
    }

    #[test]
    fn nested_limits_take_minimum() {
        let plan = LogicalPlan::Limit {
            input: Box::new(LogicalPlan::Limit {
                input: scan(),
                n: 3,
            }),
            n: 10,
        };
        assert_eq!(optimize(plan), LogicalPlan::Limit { input: scan(), n: 3 });
    }

    #[test]
    fn other_nodes_untouched() {
        let plan = LogicalPlan::Sort {
            input: scan(),
            keys: vec![tabkit_core::dag::SortKey::asc("a")],
        };
        assert_eq!(optimize(plan.clone()), plan);
    }
}
