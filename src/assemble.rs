//! Order reconciliation between fetched descriptors and the statement's
//! request order.
//!
//! Fetch strategies regroup columns per table, so descriptors come back in
//! table-grouped order. The caller asked for them in statement order; this
//! pass restores that order when it can and degrades to the fetched order
//! when it cannot.

use tracing::warn;

use crate::field::{FieldDescriptor, FieldKind};
use crate::parse::{COLUMN_WILDCARD, PARAM_WILDCARD};

/// Reorder `fetched` to match `request_order`.
///
/// A wildcard-only request keeps the fetched order (the statement never
/// named columns, so there is nothing to restore). A count mismatch also
/// keeps the fetched order; a partially resolvable request would otherwise
/// drop descriptors. Matching is first linear hit on the display alias,
/// then on the column name, each descriptor claimed at most once.
pub fn reconcile(
    fetched: Vec<FieldDescriptor>,
    request_order: &[String],
) -> Vec<FieldDescriptor> {
    if request_order
        .iter()
        .all(|n| n == COLUMN_WILDCARD || n == PARAM_WILDCARD)
    {
        return fetched;
    }

    if fetched.len() != request_order.len() {
        warn!(
            fetched = fetched.len(),
            requested = request_order.len(),
            "descriptor count differs from request, keeping fetched order"
        );
        return fetched;
    }

    let mut claimed = vec![false; fetched.len()];
    let mut slots: Vec<usize> = Vec::with_capacity(request_order.len());

    for wanted in request_order {
        let hit = fetched.iter().enumerate().position(|(i, f)| {
            !claimed[i]
                && (f.alias().eq_ignore_ascii_case(wanted)
                    || f.name().eq_ignore_ascii_case(wanted))
        });
        match hit {
            Some(i) => {
                claimed[i] = true;
                slots.push(i);
            }
            None => {
                warn!(name = %wanted, "requested name missing from fetch, keeping fetched order");
                return fetched;
            }
        }
    }

    let mut pool: Vec<Option<FieldDescriptor>> = fetched.into_iter().map(Some).collect();
    slots
        .into_iter()
        .map(|i| pool[i].take().unwrap_or_else(|| unreachable!()))
        .collect()
}

/// Resolve requested `(name, alias)` slots against the ordered column
/// names one table actually has.
///
/// Returns `(column index, requested name, alias)` per resolved slot, in
/// request order. The walk is forward first over unclaimed columns, then
/// backward ignoring claims, so the same column requested twice resolves
/// twice. The `?` wildcard (parameter fetches) consumes the first
/// unclaimed column; the `*` wildcard (result fetches) expands to every
/// column. Unresolvable slots are dropped with a warning.
pub(crate) fn claim_slots(
    wanted: &[(String, String)],
    names: &[String],
    kind: FieldKind,
) -> Vec<(usize, String, String)> {
    if kind == FieldKind::Result && wanted.iter().any(|(n, _)| n == COLUMN_WILDCARD) {
        return names
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.clone(), String::new()))
            .collect();
    }

    let mut claimed = vec![false; names.len()];
    let mut out = Vec::with_capacity(wanted.len());

    for (name, alias) in wanted {
        let hit = if name == PARAM_WILDCARD {
            claimed.iter().position(|&c| !c)
        } else {
            names
                .iter()
                .enumerate()
                .position(|(i, n)| !claimed[i] && n.eq_ignore_ascii_case(name))
                .or_else(|| names.iter().rposition(|n| n.eq_ignore_ascii_case(name)))
        };

        match hit {
            Some(i) => {
                claimed[i] = true;
                out.push((i, name.clone(), alias.clone()));
            }
            None => warn!(column = %name, "table has no such column, skipping"),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn named(name: &str, alias: &str) -> FieldDescriptor {
        let mut f = FieldDescriptor::new(FieldKind::Result);
        f.set_names(name, alias);
        f
    }

    fn names(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn restores_request_order() {
        let fetched = vec![named("a", ""), named("c", ""), named("b", "")];
        let order = vec!["b".to_owned(), "a".to_owned(), "c".to_owned()];
        assert_eq!(names(&reconcile(fetched, &order)), ["b", "a", "c"]);
    }

    #[test]
    fn matches_on_alias_first() {
        let fetched = vec![named("total", "sum"), named("name", "")];
        let order = vec!["name".to_owned(), "sum".to_owned()];
        assert_eq!(names(&reconcile(fetched, &order)), ["name", "total"]);
    }

    #[test]
    fn count_mismatch_keeps_fetched_order() {
        let fetched = vec![named("a", ""), named("b", "")];
        let order = vec!["b".to_owned()];
        assert_eq!(names(&reconcile(fetched, &order)), ["a", "b"]);
    }

    #[test]
    fn unknown_name_keeps_fetched_order() {
        let fetched = vec![named("a", ""), named("b", "")];
        let order = vec!["b".to_owned(), "zz".to_owned()];
        assert_eq!(names(&reconcile(fetched, &order)), ["a", "b"]);
    }

    #[test]
    fn wildcard_request_passes_through() {
        let fetched = vec![named("x", ""), named("y", "")];
        let order = vec![COLUMN_WILDCARD.to_owned()];
        assert_eq!(names(&reconcile(fetched, &order)), ["x", "y"]);
    }

    #[test]
    fn claim_forward_then_backward() {
        let names = vec!["id".to_owned(), "name".to_owned()];
        let wanted = vec![
            ("id".to_owned(), String::new()),
            ("id".to_owned(), "again".to_owned()),
        ];
        let slots = claim_slots(&wanted, &names, FieldKind::Result);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].0, 0);
        // the duplicate request reuses the claimed column, found backward
        assert_eq!(slots[1].0, 0);
        assert_eq!(slots[1].2, "again");
    }

    #[test]
    fn claim_wildcards() {
        let names = vec!["x".to_owned(), "y".to_owned(), "z".to_owned()];

        let all = claim_slots(
            &[(COLUMN_WILDCARD.to_owned(), String::new())],
            &names,
            FieldKind::Result,
        );
        assert_eq!(all.len(), 3);

        let params = claim_slots(
            &[
                (PARAM_WILDCARD.to_owned(), String::new()),
                (PARAM_WILDCARD.to_owned(), String::new()),
            ],
            &names,
            FieldKind::Parameter,
        );
        assert_eq!(params[0].0, 0);
        assert_eq!(params[1].0, 1);
    }

    #[test]
    fn claim_drops_unknown_names() {
        let names = vec!["a".to_owned()];
        let wanted = vec![
            ("missing".to_owned(), String::new()),
            ("a".to_owned(), String::new()),
        ];
        let slots = claim_slots(&wanted, &names, FieldKind::Result);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].1, "a");
    }

    #[test]
    fn duplicate_names_claim_distinct_descriptors() {
        let fetched = vec![named("id", "left_id"), named("id", "right_id")];
        let order = vec!["right_id".to_owned(), "left_id".to_owned()];
        let out = reconcile(fetched, &order);
        assert_eq!(out[0].alias(), "right_id");
        assert_eq!(out[1].alias(), "left_id");
    }
}
