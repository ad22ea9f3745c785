//! Property tests for the ranked set and codec.

use ironrank::testing::assert_rank_invariants;
use ironrank::{RankedBoundedSet, ScoredEntry, TopKCodec, encode};
use quickcheck::quickcheck;

const K: usize = 5;

/// Small id space so updates and retractions hit existing entries often.
fn entry(id: u8, score: i16) -> ScoredEntry {
    ScoredEntry::new(i64::from(id % 12), i64::from(score))
}

/// Straightforward sorted-vector rendition of the same admission rule.
#[derive(Default)]
struct Model(Vec<ScoredEntry>);

impl Model {
    fn add(&mut self, e: ScoredEntry) {
        self.0.retain(|x| x.id != e.id);
        self.0.push(e);
        self.0.sort();
        self.0.truncate(K);
    }

    fn remove(&mut self, id: i64) {
        self.0.retain(|x| x.id != id);
    }
}

fn apply(ops: &[(bool, u8, i16)]) -> RankedBoundedSet {
    let mut s = RankedBoundedSet::new(K);
    for &(add, id, score) in ops {
        if add {
            s.add(entry(id, score));
        } else {
            s.remove(entry(id, score));
        }
    }
    s
}

quickcheck! {
    fn invariants_hold_after_every_operation(ops: Vec<(bool, u8, i16)>) -> bool {
        let mut s = RankedBoundedSet::new(K);
        for (add, id, score) in ops {
            if add {
                s.add(entry(id, score));
            } else {
                s.remove(entry(id, score));
            }
            assert_rank_invariants(&s);
        }
        true
    }

    fn matches_sorted_vector_model(ops: Vec<(bool, u8, i16)>) -> bool {
        let mut s = RankedBoundedSet::new(K);
        let mut model = Model::default();
        for (add, id, score) in ops {
            let e = entry(id, score);
            if add {
                s.add(e);
                model.add(e);
            } else {
                s.remove(e);
                model.remove(e.id);
            }
            if s.to_vec() != model.0 {
                return false;
            }
        }
        true
    }

    fn round_trip_reproduces_iteration(ops: Vec<(bool, u8, i16)>) -> bool {
        let s = apply(&ops);
        let back = TopKCodec::new(K).decode(&encode(&s)).unwrap();
        back.to_vec() == s.to_vec() && back == s
    }

    fn encoded_length_is_sixteen_per_entry(ops: Vec<(bool, u8, i16)>) -> bool {
        let s = apply(&ops);
        encode(&s).len() == 16 * s.len()
    }

    fn second_remove_is_a_noop(ops: Vec<(bool, u8, i16)>, id: u8) -> bool {
        let mut once = apply(&ops);
        once.remove(entry(id, 0));
        let mut twice = once.clone();
        twice.remove(entry(id, 0)).is_none() && twice == once
    }

    fn admission_against_full_set(ops: Vec<(bool, u8, i16)>, id: u8, score: i16) -> bool {
        let mut s = apply(&ops);
        let incoming = ScoredEntry::new(100 + i64::from(id), i64::from(score));
        let Some(last) = s.last().filter(|_| s.is_full()) else {
            return true;
        };
        let before = s.to_vec();
        s.add(incoming);
        if incoming < last {
            s.contains_id(incoming.id) && !s.contains_id(last.id) && s.len() == K
        } else {
            s.to_vec() == before
        }
    }
}
