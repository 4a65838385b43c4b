//! Cartesian expansion of loop item groups.

use crate::canvas::Node;

/// Returns every combination picking one item from each group, in group order.
///
/// Combinations are ordered with the last group varying fastest. An empty
/// group yields no combinations.
pub(crate) fn combinations(groups: &[Vec<Node>]) -> Vec<Vec<Node>> {
    let mut acc: Vec<Vec<Node>> = vec![Vec::with_capacity(groups.len())];

    for group in groups {
        let mut next = Vec::with_capacity(acc.len() * group.len());
        for combo in &acc {
            for item in group {
                let mut extended = combo.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        acc = next;
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NodeRole;

    fn group(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id, NodeRole::Default)).collect()
    }

    fn ids(combo: &[Node]) -> Vec<&str> {
        combo.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn product_of_two_groups() {
        let combos = combinations(&[group(&["a", "b"]), group(&["x", "y", "z"])]);

        assert_eq!(combos.len(), 6);
        assert_eq!(ids(&combos[0]), vec!["a", "x"]);
        assert_eq!(ids(&combos[5]), vec!["b", "z"]);
    }

    #[test]
    fn empty_group_yields_nothing() {
        assert!(combinations(&[group(&["a"]), group(&[])]).is_empty());
    }

    #[test]
    fn no_groups_yields_one_empty_combination() {
        assert_eq!(combinations(&[]), vec![Vec::<Node>::new()]);
    }
}
