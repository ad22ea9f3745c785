use anyhow::Result;
use ironrank::testing::{assert_chart_eq, assert_rank_invariants};
use ironrank::{CodecError, RECORD_LEN, RankedBoundedSet, ScoredEntry, TopKCodec, encode};

fn records(pairs: &[(i64, i64)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, score) in pairs {
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&score.to_be_bytes());
    }
    out
}

#[test]
fn empty_set_encodes_to_nothing() {
    assert!(encode(&RankedBoundedSet::new(5)).is_empty());
}

#[test]
fn empty_input_decodes_to_empty_set() -> Result<()> {
    let s = TopKCodec::new(5).decode(&[])?;
    assert!(s.is_empty());
    assert_eq!(s.capacity(), 5);
    Ok(())
}

#[test]
fn encoding_follows_rank_order() {
    let mut s = RankedBoundedSet::new(5);
    for (id, score) in [(3, 1), (1, 7), (2, 7)] {
        s.add(ScoredEntry::new(id, score));
    }
    let bytes = encode(&s);
    assert_eq!(bytes.len(), 3 * RECORD_LEN);
    assert_eq!(bytes, records(&[(1, 7), (2, 7), (3, 1)]));
}

#[test]
fn round_trip_preserves_ids_scores_and_order() -> Result<()> {
    let codec = TopKCodec::new(5);
    let mut s = RankedBoundedSet::new(5);
    for (id, score) in [(1, 10), (2, 9), (3, 8), (4, 7), (6, 7)] {
        s.add(ScoredEntry::new(id, score));
    }
    let back = codec.decode(&codec.encode(&s))?;
    assert_eq!(back, s);
    assert_eq!(back.to_vec(), s.to_vec());
    Ok(())
}

#[test]
fn oversized_input_is_trimmed_to_bound() -> Result<()> {
    let bytes = records(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (7, 7)]);
    let s = TopKCodec::new(5).decode(&bytes)?;
    assert_chart_eq(&s, &[(7, 7), (6, 6), (5, 5), (4, 4), (3, 3)]);
    Ok(())
}

#[test]
fn unordered_input_decodes_into_rank_order() -> Result<()> {
    let bytes = records(&[(9, 1), (4, 5), (2, 5)]);
    let s = TopKCodec::new(5).decode(&bytes)?;
    assert_chart_eq(&s, &[(2, 5), (4, 5), (9, 1)]);
    Ok(())
}

#[test]
fn duplicate_ids_keep_the_later_record() -> Result<()> {
    let bytes = records(&[(1, 10), (2, 3), (1, 1)]);
    let s = TopKCodec::new(5).decode(&bytes)?;
    assert_chart_eq(&s, &[(2, 3), (1, 1)]);
    assert_rank_invariants(&s);
    Ok(())
}

#[test]
fn truncated_record_is_rejected() {
    let codec = TopKCodec::default();
    for len in [1usize, 15, 17, 33] {
        let err = codec.decode(&vec![0u8; len]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Format {
                len,
                trailing: len % RECORD_LEN
            }
        );
    }
}

#[test]
fn decoded_set_uses_codec_bound() -> Result<()> {
    let mut big = RankedBoundedSet::new(10);
    for id in 0..10 {
        big.add(ScoredEntry::new(id, 100 - id));
    }
    let small = TopKCodec::new(3).decode(&encode(&big))?;
    assert_chart_eq(&small, &[(0, 100), (1, 99), (2, 98)]);
    Ok(())
}
