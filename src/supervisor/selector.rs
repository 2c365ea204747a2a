use rand::Rng;

use crate::config::ActionTable;

/// Draws one `(key, value)` pair uniformly at random; `None` for an empty table.
///
/// Repeats across draws are expected.
pub fn choose<'t, R: Rng + ?Sized>(table: &'t ActionTable, rng: &mut R) -> Option<(&'t str, &'t str)> {
    if table.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..table.len());
    table
        .iter()
        .nth(index)
        .map(|(k, v)| (k.as_str(), v.as_str()))
}
