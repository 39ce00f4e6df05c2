//! Normal forms and combination of domains.

use std::cmp::Ordering;

use domain_model_rs::{BoolOp, Clause, Domain, Operator, Value};

/// Removes empty and duplicate branches and flattens nested groups with the
/// same operator. A group left with one branch is replaced by that branch.
///
/// An empty branch matches everything: it is dropped from an AND and turns
/// an OR into the empty domain.
pub fn simplify(domain: &Domain) -> Domain {
    normalize(domain, false)
}

/// Sorts the branches of every group: clauses first, ordered by field,
/// operator, value and target, then groups.
pub fn sort(domain: &Domain) -> Domain {
    match domain {
        Domain::Leaf(_) => domain.clone(),
        Domain::Group(op, branches) => {
            let mut branches: Vec<Domain> = branches.iter().map(sort).collect();
            branches.sort_by(compare_domains);
            Domain::Group(*op, branches)
        }
    }
}

/// Simplifies and sorts a domain so that equivalent domains compare equal.
///
/// Idempotent: `canonicalize(&canonicalize(d)) == canonicalize(d)`.
///
/// ```
/// use domain_engine_rs::canonicalize;
/// use domain_model_rs::{Domain, Operator};
///
/// let a = Domain::leaf("a", Operator::Eq, 1);
/// let b = Domain::leaf("b", Operator::Eq, 2);
/// let nested = Domain::and(vec![b.clone(), Domain::and(vec![a.clone(), b.clone()])]);
/// assert_eq!(canonicalize(&nested), Domain::and(vec![a, b]));
/// ```
pub fn canonicalize(domain: &Domain) -> Domain {
    normalize(domain, true)
}

fn normalize(domain: &Domain, sorted: bool) -> Domain {
    let Domain::Group(op, branches) = domain else {
        return domain.clone();
    };

    let mut flat: Vec<Domain> = Vec::with_capacity(branches.len());
    for branch in branches {
        let branch = normalize(branch, sorted);
        if branch.is_empty() {
            match op {
                BoolOp::And => continue,
                BoolOp::Or => return Domain::empty(),
            }
        }
        match branch {
            Domain::Group(inner, children) if inner == *op => flat.extend(children),
            other => flat.push(other),
        }
    }

    let mut unique: Vec<Domain> = Vec::with_capacity(flat.len());
    for branch in flat {
        if !unique.contains(&branch) {
            unique.push(branch);
        }
    }
    if sorted {
        unique.sort_by(compare_domains);
    }

    match unique.len() {
        0 => Domain::empty(),
        1 => unique.remove(0),
        _ => Domain::Group(*op, unique),
    }
}

fn compare_domains(a: &Domain, b: &Domain) -> Ordering {
    match (a, b) {
        (Domain::Leaf(a), Domain::Leaf(b)) => compare_clauses(a, b),
        (Domain::Leaf(_), Domain::Group(_, _)) => Ordering::Less,
        (Domain::Group(_, _), Domain::Leaf(_)) => Ordering::Greater,
        (Domain::Group(op_a, a), Domain::Group(op_b, b)) => op_a.cmp(op_b).then_with(|| {
            a.iter()
                .zip(b)
                .map(|(x, y)| compare_domains(x, y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len()))
        }),
    }
}

fn compare_clauses(a: &Clause, b: &Clause) -> Ordering {
    a.field
        .cmp(&b.field)
        .then_with(|| a.operator.as_str().cmp(b.operator.as_str()))
        .then_with(|| a.value.canonical_cmp(&b.value))
        .then_with(|| a.target.cmp(&b.target))
}

/// Joins domains under `op`, simplifying the result.
pub fn merge(domains: &[Domain], op: BoolOp) -> Domain {
    simplify(&Domain::Group(op, domains.to_vec()))
}

/// Like [`merge`], but empty domains are ignored instead of matching
/// everything.
pub fn concat(domains: &[Domain], op: BoolOp) -> Domain {
    let present: Vec<Domain> = domains
        .iter()
        .filter(|domain| !domain.is_empty())
        .cloned()
        .collect();
    merge(&present, op)
}

/// Returns the field and value a domain pins, if it pins exactly one.
///
/// The domain must be a single `=` clause or a one-element `in` clause,
/// alone or as the only branch of an AND. A clause on `field.id` with a
/// target model pins `field` to a reference.
///
/// ```
/// use domain_engine_rs::unique_value;
/// use domain_model_rs::{Domain, Operator, Value};
///
/// let domain = Domain::leaf("state", Operator::In, vec!["done"]);
/// assert_eq!(
///     unique_value(&domain),
///     Some(("state".to_string(), Value::from("done")))
/// );
/// assert_eq!(unique_value(&Domain::leaf("amount", Operator::Gt, 1)), None);
/// ```
pub fn unique_value(domain: &Domain) -> Option<(String, Value)> {
    let clause = match domain {
        Domain::Leaf(clause) => clause,
        Domain::Group(BoolOp::And, branches) if branches.len() == 1 => branches[0].as_clause()?,
        Domain::Group(_, _) => return None,
    };

    let value = match (&clause.operator, &clause.value) {
        (Operator::Eq, Value::List(_)) => return None,
        (Operator::Eq, value) => value.clone(),
        (Operator::In, Value::List(items)) if items.len() == 1 => items[0].clone(),
        _ => return None,
    };

    match (clause.field.split_once('.'), &clause.target) {
        (None, _) => Some((clause.field.clone(), value)),
        (Some((name, "id")), Some(model)) => match value {
            Value::Integer(id) => Some((name.to_string(), Value::Reference(model.clone(), id))),
            _ => None,
        },
        _ => None,
    }
}

/// Rewrites the clauses of a domain on a relation as clauses on the
/// related model.
///
/// `party.name` becomes `name` and a clause on the relation itself becomes
/// a clause on `id`. A hierarchy clause without sub-field compares on the
/// field named by its target. With `strip_target` the target models are
/// removed.
pub fn localize_domain(domain: &Domain, strip_target: bool) -> Domain {
    match domain {
        Domain::Group(op, branches) => Domain::Group(
            *op,
            branches
                .iter()
                .map(|branch| localize_domain(branch, strip_target))
                .collect(),
        ),
        Domain::Leaf(clause) => {
            let mut local = clause.clone();
            match clause.field.split_once('.') {
                Some((_, rest)) => local.field = rest.to_string(),
                None => match (&clause.target, clause.operator.is_hierarchical()) {
                    (Some(target), true) => {
                        local.field = target.clone();
                        local.target = None;
                    }
                    _ => local.field = "id".to_string(),
                },
            }
            if strip_target {
                local.target = None;
            }
            Domain::Leaf(local)
        }
    }
}
