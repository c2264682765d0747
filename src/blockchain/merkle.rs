use crate::digest::combine;
use crate::transaction::Transaction;

/// Merkle root of the transaction digests, in order.
///
/// An empty list has an empty root. A lone digest is paired with itself, and
/// every level with an odd number of nodes pairs its last node with itself.
pub fn merkle_root(transactions: &[Transaction]) -> String {
    let mut level: Vec<String> = transactions.iter().map(|t| t.hash.clone()).collect();

    match level.len() {
        0 => return String::new(),
        1 => return combine(&level[0], &level[0]),
        _ => {}
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => combine(left, right),
                [single] => combine(single, single),
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level.remove(0)
}
