//! Combinatorial helpers: power sets and enumerated state tables.

/// A dense table of equally wide bit vectors, one row per state id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateTable {
    width: usize,
    rows: usize,
    bits: Vec<u8>,
}

impl StateTable {
    fn with_capacity(width: usize, rows: usize) -> Self {
        Self {
            width,
            rows: 0,
            bits: Vec::with_capacity(width * rows),
        }
    }

    fn push_row(&mut self, row: impl IntoIterator<Item = u8>) {
        let before = self.bits.len();
        self.bits.extend(row);
        debug_assert_eq!(self.bits.len() - before, self.width);
        self.rows += 1;
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of bits in each row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The bit vector for row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[u8] {
        assert!(index < self.rows, "state {index} out of range");
        &self.bits[index * self.width..(index + 1) * self.width]
    }

    /// Iterate over all rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.rows).map(|i| self.row(i))
    }
}

/// Every state of `num_nodes` binary nodes, indexed little-endian: bit `k`
/// of the state id is the value of node `k`.
pub(crate) fn little_endian_states(num_nodes: usize) -> StateTable {
    let count = 1usize << num_nodes;
    let mut table = StateTable::with_capacity(num_nodes, count);
    for id in 0..count {
        table.push_row((0..num_nodes).map(|k| u8::from((id >> k) & 1 == 1)));
    }
    table
}

/// Every `(sensor_state, motor_state)` pair, row `s * 2^num_motors + m`,
/// holding the big-endian bits of `s` followed by the big-endian bits of `m`.
pub(crate) fn sensor_motor_states(num_sensors: usize, num_motors: usize) -> StateTable {
    let sensor_states = 1usize << num_sensors;
    let motor_states = 1usize << num_motors;
    let mut table =
        StateTable::with_capacity(num_sensors + num_motors, sensor_states * motor_states);
    for s in 0..sensor_states {
        for m in 0..motor_states {
            table.push_row(big_endian_bits(s, num_sensors).chain(big_endian_bits(m, num_motors)));
        }
    }
    table
}

fn big_endian_bits(value: usize, width: usize) -> impl Iterator<Item = u8> {
    (0..width).rev().map(move |k| u8::from((value >> k) & 1 == 1))
}

/// All subsets of `items`, smallest first, lexicographic (by position)
/// within each size. The empty set comes first.
pub(crate) fn powerset(items: &[usize]) -> Vec<Vec<usize>> {
    let n = items.len();
    let mut subsets = Vec::with_capacity(1 << n);
    for size in 0..=n {
        // Positions of the current combination, advanced like an odometer.
        let mut positions: Vec<usize> = (0..size).collect();
        loop {
            subsets.push(positions.iter().map(|&p| items[p]).collect());
            let Some(slot) = (0..size).rev().find(|&i| positions[i] != i + n - size) else {
                break;
            };
            positions[slot] += 1;
            for next in slot + 1..size {
                positions[next] = positions[next - 1] + 1;
            }
        }
    }
    subsets
}
