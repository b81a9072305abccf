//! Million-scale end-to-end exercises for the hash table.

use probe_table::HashTable;

const COUNT: u64 = 2_000_000;

#[test]
fn two_million_inserts_then_lookups() {
    let mut map: HashTable<u64, u64> = HashTable::new();

    for i in 0..COUNT {
        *map.get_or_default(i) = i;
    }
    assert_eq!(map.len() as u64, COUNT);

    for i in 0..COUNT {
        assert_eq!(map.get(&i), Some(&i));
    }
}

#[test]
fn two_million_removals_drain_the_table() {
    let mut map: HashTable<u64, u64> = HashTable::new();

    for i in 0..COUNT {
        map.insert(i, i);
    }
    for i in 0..COUNT {
        map.remove(&i);
    }

    assert_eq!(map.len(), 0);
    assert_eq!(map.iter().count(), 0, "no slot may remain live");

    // A drained table is still a working table.
    map.insert(42, 1);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&42), Some(&1));
}
