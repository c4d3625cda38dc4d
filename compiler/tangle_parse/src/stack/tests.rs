#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use smallvec::smallvec;

fn stack(id: u32) -> ParseStack {
    let mut s = ParseStack::new(CandidateId::new(id), Name::from_raw(1), 0);
    s.push(ProductionId::new(0), 0);
    s
}

fn branch(fork: u32, alternative: u32, ambiguous: bool) -> Branch {
    Branch {
        fork: ForkId::new(fork),
        alternative,
        ambiguous,
    }
}

#[test]
fn test_difference_in_one_slot() {
    let mut a = stack(0);
    let mut b = stack(1);
    a.frames[1].children = smallvec![NodeId::new(1), NodeId::new(2)];
    b.frames[1].children = smallvec![NodeId::new(1), NodeId::new(3)];
    assert_eq!(a.difference(&b), Difference::Slot { frame: 1, child: 1 });

    b.frames[1].children[1] = NodeId::new(2);
    assert_eq!(a.difference(&b), Difference::Identical);
}

#[test]
fn test_difference_in_two_slots_or_shape() {
    let mut a = stack(0);
    let mut b = stack(1);
    a.frames[1].children = smallvec![NodeId::new(1), NodeId::new(2)];
    b.frames[1].children = smallvec![NodeId::new(4), NodeId::new(3)];
    assert_eq!(a.difference(&b), Difference::Many);

    b.frames[1].children = smallvec![NodeId::new(1)];
    assert_eq!(a.difference(&b), Difference::Many);

    let mut c = a.clone();
    c.frames[1].dot = 1;
    assert_eq!(a.difference(&c), Difference::Many);
}

#[test]
fn test_rank_and_divergence() {
    let mut a = stack(0);
    let mut b = stack(1);
    a.lineage = smallvec![branch(0, 1, false), branch(2, 0, true)];
    b.lineage = smallvec![branch(0, 1, false), branch(2, 1, true)];

    assert_eq!(a.rank_cmp(&b), Ordering::Less);
    assert_eq!(
        a.divergence(&b),
        Some((branch(2, 0, true), branch(2, 1, true)))
    );
    assert_eq!(a.branch_at(ForkId::new(0)), Some(branch(0, 1, false)));
    assert_eq!(a.branch_at(ForkId::new(9)), None);
}

#[test]
fn test_complete_goal_frame() {
    let mut s = ParseStack::new(CandidateId::new(0), Name::from_raw(1), 0);
    assert!(!s.is_complete());
    s.frames[0].children.push(NodeId::new(5));
    s.frames[0].dot = 1;
    assert!(s.is_complete());
    assert_eq!(s.root(), Some(NodeId::new(5)));
}
