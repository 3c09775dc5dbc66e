//! Delta encoding for sorted position sequences.
//!
//! Position lists are strictly ascending, so storing first-value-then-gaps
//! keeps the integers small; postcard's varint integer encoding then shrinks
//! them on disk.

pub mod delta {
    /// Encode a sorted sequence using delta encoding.
    ///
    /// First value is stored as-is, subsequent values as differences.
    /// Example: [5, 7, 9, 12] -> [5, 2, 2, 3]
    pub fn encode(sorted_values: &[u32]) -> Vec<u32> {
        if sorted_values.is_empty() {
            return Vec::new();
        }

        let mut deltas = Vec::with_capacity(sorted_values.len());
        deltas.push(sorted_values[0]);

        for i in 1..sorted_values.len() {
            deltas.push(sorted_values[i] - sorted_values[i - 1]);
        }

        deltas
    }

    /// Decode a delta-encoded sequence.
    pub fn decode(deltas: &[u32]) -> Vec<u32> {
        if deltas.is_empty() {
            return Vec::new();
        }

        let mut values = Vec::with_capacity(deltas.len());
        values.push(deltas[0]);

        for i in 1..deltas.len() {
            values.push(values[i - 1] + deltas[i]);
        }

        values
    }
}
