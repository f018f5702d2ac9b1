use super::*;

fn attr(i: usize) -> AttrId {
    AttrId::from_usize(i)
}

fn attrs(bits: &[usize]) -> AttrSet {
    bits.iter().map(|&b| attr(b)).collect()
}

#[derive(Default)]
struct Collect(Vec<StrippedFd>);

impl FdSink for Collect {
    fn add_fd(&mut self, fd: StrippedFd) {
        self.0.push(fd);
    }
}

fn collect_fds(tree: &FdTree, max_lhs: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut sink = Collect::default();
    tree.emit(&mut sink, max_lhs);
    sink.0
        .iter()
        .map(|fd| (fd.lhs.ones().collect(), fd.rhs.ones().collect()))
        .collect()
}

#[test]
fn generalization_lookup() {
    let mut tree = FdTree::new(4);
    tree.add(&attrs(&[0, 2]), attr(1));

    assert!(tree.contains_generalization(&attrs(&[0, 2]), attr(1)));
    assert!(tree.contains_generalization(&attrs(&[0, 1, 2]), attr(1)));
    assert!(tree.contains_generalization(&attrs(&[0, 2, 3]), attr(1)));
    assert!(!tree.contains_generalization(&attrs(&[0]), attr(1)));
    assert!(!tree.contains_generalization(&attrs(&[2, 3]), attr(1)));
    assert!(!tree.contains_generalization(&attrs(&[0, 2]), attr(3)));
}

#[test]
fn empty_lhs_generalizes_everything() {
    let mut tree = FdTree::new(3);
    tree.add(&AttrSet::new(), attr(2));
    assert!(tree.contains_generalization(&AttrSet::new(), attr(2)));
    assert!(tree.contains_generalization(&attrs(&[0, 1]), attr(2)));
    assert!(!tree.contains_generalization(&attrs(&[0, 1]), attr(0)));
}

#[test]
fn take_generalization_removes_and_reconstructs() {
    let mut tree = FdTree::new(4);
    tree.add(&attrs(&[0, 2]), attr(1));
    tree.add(&attrs(&[3]), attr(1));

    let lhs = attrs(&[0, 2, 3]);
    let mut out = AttrSet::new();

    assert!(tree.take_generalization(&lhs, attr(1), &mut out));
    assert_eq!(out, attrs(&[0, 2]));
    assert!(!tree.contains_generalization(&attrs(&[0, 2]), attr(1)));
    assert!(tree.contains_generalization(&lhs, attr(1)));

    assert!(tree.take_generalization(&lhs, attr(1), &mut out));
    assert_eq!(out, attrs(&[3]));

    assert!(!tree.take_generalization(&lhs, attr(1), &mut out));
    assert!(out.is_empty());
}

#[test]
fn take_generalization_ignores_non_subsets() {
    let mut tree = FdTree::new(4);
    tree.add(&attrs(&[1, 3]), attr(0));
    let mut out = AttrSet::new();
    assert!(!tree.take_generalization(&attrs(&[1, 2]), attr(0), &mut out));
    assert!(tree.contains_generalization(&attrs(&[1, 3]), attr(0)));
}

#[test]
fn specialization_must_be_proper() {
    let mut tree = FdTree::new(4);
    tree.add(&attrs(&[0, 1]), attr(2));
    let mut out = AttrSet::new();

    assert!(tree.contains_specialization(&attrs(&[0]), attr(2), &mut out));
    assert_eq!(out, attrs(&[0, 1]));
    assert!(tree.contains_specialization(&attrs(&[1]), attr(2), &mut out));
    assert!(tree.contains_specialization(&AttrSet::new(), attr(2), &mut out));

    // The recorded LHS itself is not a proper superset.
    assert!(!tree.contains_specialization(&attrs(&[0, 1]), attr(2), &mut out));
    // Nor is anything with an attribute outside the recorded LHS.
    assert!(!tree.contains_specialization(&attrs(&[0, 3]), attr(2), &mut out));
    // RHS must match.
    assert!(!tree.contains_specialization(&attrs(&[0]), attr(3), &mut out));
}

#[test]
fn root_entry_is_not_its_own_specialization() {
    let mut tree = FdTree::new(2);
    tree.add_most_general();
    let mut out = AttrSet::new();
    assert!(!tree.contains_specialization(&AttrSet::new(), attr(0), &mut out));
}

#[test]
fn filter_keeps_only_maximal_lhs() {
    let mut tree = FdTree::new(3);
    tree.add(&attrs(&[0]), attr(2));
    tree.add(&attrs(&[0, 1]), attr(2));
    tree.add(&attrs(&[1]), attr(0));
    tree.filter_specializations();

    let mut seen = Vec::new();
    tree.for_each_fd(|lhs, rhs| {
        seen.push((lhs.iter().map(|a| a.index()).collect::<Vec<_>>(), rhs.index()))
    });
    assert_eq!(seen, vec![(vec![0, 1], 2), (vec![1], 0)]);
}

#[test]
fn filter_is_per_rhs() {
    let mut tree = FdTree::new(3);
    tree.add(&attrs(&[0]), attr(1));
    tree.add(&attrs(&[0, 2]), attr(1));
    // Same small LHS, different RHS: not subsumed.
    tree.add(&attrs(&[0]), attr(2));
    tree.filter_specializations();

    let mut seen = Vec::new();
    tree.for_each_fd(|lhs, rhs| {
        seen.push((lhs.iter().map(|a| a.index()).collect::<Vec<_>>(), rhs.index()))
    });
    assert_eq!(seen, vec![(vec![0], 2), (vec![0, 2], 1)]);
}

#[test]
fn emission_bundles_rhs_per_node() {
    let mut tree = FdTree::new(3);
    tree.add(&attrs(&[0]), attr(1));
    tree.add(&attrs(&[0]), attr(2));
    assert_eq!(collect_fds(&tree, usize::MAX), vec![(vec![0], vec![1, 2])]);
}

#[test]
fn emission_respects_the_lhs_cap() {
    let mut tree = FdTree::new(3);
    tree.add(&attrs(&[0]), attr(1));
    tree.add(&attrs(&[0, 1]), attr(2));
    assert_eq!(
        collect_fds(&tree, 1),
        vec![(vec![0], vec![1])]
    );
    assert_eq!(
        collect_fds(&tree, 2),
        vec![(vec![0], vec![1]), (vec![0, 1], vec![2])]
    );
}

#[test]
fn most_general_seed_emits_empty_lhs() {
    let mut tree = FdTree::new(2);
    tree.add_most_general();
    assert_eq!(collect_fds(&tree, usize::MAX), vec![(vec![], vec![0, 1])]);
}

#[test]
fn add_is_idempotent() {
    let mut tree = FdTree::new(3);
    tree.add(&attrs(&[1]), attr(0));
    tree.add(&attrs(&[1]), attr(0));
    assert_eq!(collect_fds(&tree, usize::MAX), vec![(vec![1], vec![0])]);
}
