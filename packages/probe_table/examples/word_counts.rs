//! Counting words with the hash table and listing them with the array.

use probe_table::{ArrayList, HashTable};

fn main() {
    let text = "the quick brown fox jumps over the lazy dog the fox";

    let mut counts: HashTable<&str, u64> = HashTable::new();
    for word in text.split_whitespace() {
        *counts.get_or_default(word) += 1;
    }

    let mut lines: ArrayList<String> = ArrayList::new();
    for (word, count) in &counts {
        lines.push(format!("{word}: {count}"));
    }
    lines.as_mut_slice().sort();

    for line in &lines {
        println!("{line}");
    }
}
