// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::anyhow;
use persistent_iter::{Cursor, Steps};
use persistent_vector::{Vector, VectorSync};
use quickcheck_macros::quickcheck;

#[test]
fn empty_vector() {
    let v: Vector<u32> = Vector::new();
    assert_eq!(v.len(), 0);
    assert!(v.is_empty());
    assert_eq!(v.get(0), None);
    assert_eq!(v.first(), None);
    assert_eq!(v.last(), None);
    assert_eq!(v.iter().count(), 0);
    assert!(v.cursor().is_none());

    // Popping an empty vector is a no-op.
    let popped = v.pop();
    assert_eq!(popped.len(), 0);
}

#[test]
fn readme_walkthrough() {
    let v: Vector<&str> = Vector::new()
        .push("item0")
        .push("item1")
        .push("item2")
        .push("item3");
    assert_eq!(v.len(), 4);

    let shorter = v.pop();
    assert_eq!(shorter.len(), 3);
    assert_eq!(shorter.get(1), Some(&"item1"));

    let updated = shorter.set(1, "item1_updated");
    assert_eq!(updated.get(1), Some(&"item1_updated"));

    // The original observed none of it.
    assert_eq!(v.len(), 4);
    assert_eq!(v.get(1), Some(&"item1"));
    assert_eq!(v.get(3), Some(&"item3"));
}

#[test]
fn push_appends_at_the_end() {
    let mut v: Vector<usize> = Vector::new();
    for i in 0..100 {
        let pushed = v.push(i);
        assert_eq!(pushed.get(v.len()), Some(&i));
        assert_eq!(pushed.len(), v.len() + 1);
        v = pushed;
    }
}

#[test]
fn pop_undoes_push() {
    let mut v: Vector<usize> = Vector::new();
    for i in 0..200 {
        v = v.push(i);
    }
    for x in [1000, 2000] {
        let back = v.push(x).pop();
        assert_eq!(back.len(), v.len());
        assert!(back.iter().eq(v.iter()));
    }
}

#[test]
fn set_updates_exactly_one_slot() {
    let v: Vector<usize> = (0..100).fold(Vector::new(), |v, i| v.push(i));
    // One index in the body, one in the tail.
    for target in [17, 97] {
        let updated = v.set(target, 4242);
        assert_eq!(updated.get(target), Some(&4242));
        assert_eq!(updated.len(), v.len());
        for j in 0..100 {
            if j != target {
                assert_eq!(updated.get(j), v.get(j));
            }
        }
        // Receiver untouched.
        assert_eq!(v.get(target), Some(&target));
    }
}

#[test]
fn out_of_bounds_reads_and_writes() {
    let v: Vector<&str> = Vector::new().push("a").push("b");
    assert_eq!(v.get(2), None);
    assert_eq!(v.get(usize::MAX), None);

    let unchanged = v.set(2, "c");
    assert_eq!(unchanged.len(), v.len());
    assert!(unchanged.iter().eq(v.iter()));
}

#[test]
fn growth_to_ten_thousand() {
    let values: Vec<String> = (0..10_000).map(|i| format!("value_{i}")).collect();
    let v: Vector<String> = values.iter().fold(Vector::new(), |v, s| v.push(s.clone()));
    assert_eq!(v.len(), 10_000);
    for (i, value) in values.iter().enumerate() {
        assert_eq!(v.get(i), Some(value));
    }
}

#[test]
fn boundary_sizes() {
    for n in [31, 32, 33, 63, 64, 65, 1023, 1024, 1025, 32_767, 32_768, 32_769] {
        let v: Vector<usize> = (0..n).fold(Vector::new(), |v, i| v.push(i));
        assert_eq!(v.len(), n);
        assert_eq!(v.first(), Some(&0));
        assert_eq!(v.last(), Some(&(n - 1)));
        assert_eq!(v.get(n / 2), Some(&(n / 2)));
        assert_eq!(v.iter().count(), n);
        assert!(v.iter().copied().eq(0..n));
    }
}

#[test]
fn pop_across_block_boundaries() {
    let mut v: Vector<usize> = (0..1025).fold(Vector::new(), |v, i| v.push(i));
    for expected_len in (0..1025).rev() {
        assert_eq!(v.last(), Some(&expected_len));
        v = v.pop();
        assert_eq!(v.len(), expected_len);
    }
    assert!(v.is_empty());

    // The vector stays usable after draining.
    let refilled = v.push(7);
    assert_eq!(refilled.get(0), Some(&7));
}

#[test]
fn old_versions_stay_intact() {
    let mut versions: Vec<Vector<usize>> = Vec::new();
    let mut v: Vector<usize> = Vector::new();
    for i in 0..1000 {
        if i % 100 == 0 {
            versions.push(v.clone());
        }
        v = v.push(i);
    }
    for (snapshot, version) in versions.iter().enumerate() {
        let len = snapshot * 100;
        assert_eq!(version.len(), len);
        assert!(version.iter().copied().eq(0..len));
    }
}

#[test]
fn iteration_in_index_order() {
    let v: Vector<usize> = (0..500).fold(Vector::new(), |v, i| v.push(i));
    let iter = v.iter();
    assert_eq!(iter.size_hint(), (500, Some(500)));
    assert!(iter.copied().eq(0..500));

    let collected: Vec<usize> = (&v).into_iter().copied().collect();
    assert_eq!(collected.len(), 500);
}

#[test]
fn cursor_retains_its_position() {
    let v: Vector<&str> = Vector::new().push("a").push("b").push("c");
    let first = v.cursor().unwrap();
    let second = first.step().unwrap();

    assert_eq!(first.value(), &"a");
    assert_eq!(second.value(), &"b");
    // The first cursor did not advance.
    assert_eq!(first.step().unwrap().value(), &"b");

    let walked: Vec<&str> = Steps::new(v.cursor()).collect();
    assert_eq!(walked, vec!["a", "b", "c"]);
}

#[test]
fn cursor_terminates() {
    let v: Vector<u32> = Vector::new().push(1);
    let cursor = v.cursor().unwrap();
    assert!(cursor.step().is_none());
}

#[test]
fn for_each_stops_at_the_first_error() {
    let v: Vector<u32> = (0..10).fold(Vector::new(), |v, i| v.push(i));
    let mut seen = 0;
    let result = v.for_each(|&x| {
        if x == 3 {
            return Err(anyhow!("boom"));
        }
        seen += 1;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(seen, 3);
}

#[test]
fn sync_vector_is_shareable() {
    let v: VectorSync<String> = (0..100).fold(Vector::new(), |v, i| v.push(format!("value_{i}")));
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let v = v.clone();
            scope.spawn(move || {
                for i in 0..100 {
                    assert_eq!(v.get(i), Some(&format!("value_{i}")));
                }
            });
        }
    });
}

#[quickcheck]
fn qc_push_then_read_back(items: Vec<u32>) -> bool {
    let v: Vector<u32> = items.iter().fold(Vector::new(), |v, &x| v.push(x));
    v.len() == items.len() && items.iter().enumerate().all(|(i, x)| v.get(i) == Some(x))
}

#[quickcheck]
fn qc_pop_all_empties(items: Vec<u32>) -> bool {
    let mut v: Vector<u32> = items.iter().fold(Vector::new(), |v, &x| v.push(x));
    for _ in 0..items.len() {
        v = v.pop();
    }
    v.is_empty() && v.get(0).is_none()
}

#[quickcheck]
fn qc_set_preserves_everything_else(items: Vec<u32>, index: usize, value: u32) -> bool {
    if items.is_empty() {
        return true;
    }
    let index = index % items.len();
    let v: Vector<u32> = items.iter().fold(Vector::new(), |v, &x| v.push(x));
    let updated = v.set(index, value);
    updated.get(index) == Some(&value)
        && updated.len() == v.len()
        && (0..items.len()).filter(|&j| j != index).all(|j| updated.get(j) == v.get(j))
}

#[quickcheck]
fn qc_pop_of_push_is_elementwise_identity(items: Vec<u32>, extra: u32) -> bool {
    let v: Vector<u32> = items.iter().fold(Vector::new(), |v, &x| v.push(x));
    v.push(extra).pop() == v
}
