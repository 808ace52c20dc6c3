//! Dense hour-by-entity result grids.

use serde::Serialize;

/// Dense `f64` grid indexed by hour then entity (bus, branch, generator or LSE).
///
/// Every solve allocates its own matrices; they are moved into the
/// accumulator afterwards and never written again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyMatrix {
    hours: usize,
    entities: usize,
    values: Vec<f64>,
}

impl HourlyMatrix {
    /// Zero-filled matrix.
    pub fn zeros(hours: usize, entities: usize) -> Self {
        Self {
            hours,
            entities,
            values: vec![0.0; hours * entities],
        }
    }

    /// Builds a matrix from per-hour rows.
    ///
    /// Returns `None` if the rows do not all have `entities` values.
    pub fn from_rows(rows: &[Vec<f64>], entities: usize) -> Option<Self> {
        if rows.iter().any(|r| r.len() != entities) {
            return None;
        }
        Some(Self {
            hours: rows.len(),
            entities,
            values: rows.iter().flatten().copied().collect(),
        })
    }

    /// Builds an hour-major matrix from per-entity hourly series.
    ///
    /// Returns `None` if the series lengths differ from `hours`.
    pub fn from_columns(columns: &[Vec<f64>], hours: usize) -> Option<Self> {
        if columns.iter().any(|c| c.len() != hours) {
            return None;
        }
        let mut m = Self::zeros(hours, columns.len());
        for (e, column) in columns.iter().enumerate() {
            for (h, v) in column.iter().enumerate() {
                m.set(h, e, *v);
            }
        }
        Some(m)
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    pub fn entities(&self) -> usize {
        self.entities
    }

    /// Value at `(hour, entity)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, hour: usize, entity: usize) -> f64 {
        self.values[self.offset(hour, entity)]
    }

    /// Sets the value at `(hour, entity)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn set(&mut self, hour: usize, entity: usize, value: f64) {
        let i = self.offset(hour, entity);
        self.values[i] = value;
    }

    /// All entity values for one hour.
    pub fn row(&self, hour: usize) -> &[f64] {
        let start = hour * self.entities;
        &self.values[start..start + self.entities]
    }

    /// Hourly series for one entity, copied out.
    pub fn column(&self, entity: usize) -> Vec<f64> {
        (0..self.hours).map(|h| self.get(h, entity)).collect()
    }

    /// Sum over entities for one hour.
    pub fn row_sum(&self, hour: usize) -> f64 {
        self.row(hour).iter().sum()
    }

    /// Applies `f` to every cell.
    pub fn map_in_place(&mut self, mut f: impl FnMut(f64) -> f64) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }

    /// Iterates over every cell in hour-major order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Copies the first `hours` rows into a new matrix.
    ///
    /// Rows beyond the source are zero-filled.
    pub fn truncated(&self, hours: usize) -> Self {
        let mut out = Self::zeros(hours, self.entities);
        for h in 0..hours.min(self.hours) {
            for e in 0..self.entities {
                out.set(h, e, self.get(h, e));
            }
        }
        out
    }

    fn offset(&self, hour: usize, entity: usize) -> usize {
        assert!(
            hour < self.hours && entity < self.entities,
            "index ({hour}, {entity}) out of range for {}x{} matrix",
            self.hours,
            self.entities
        );
        hour * self.entities + entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_columns_agree() {
        let m = HourlyMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]], 2);
        let m = m.unwrap_or_else(|| HourlyMatrix::zeros(0, 0));
        assert_eq!(m.hours(), 3);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0, 6.0]);
        assert_eq!(m.row_sum(2), 11.0);
    }

    #[test]
    fn from_columns_transposes() {
        let m = HourlyMatrix::from_columns(&[vec![1.0, 2.0], vec![10.0, 20.0]], 2);
        assert_eq!(m.as_ref().map(|m| m.row(0).to_vec()), Some(vec![1.0, 10.0]));
        assert!(HourlyMatrix::from_columns(&[vec![1.0]], 2).is_none());
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(HourlyMatrix::from_rows(&[vec![1.0], vec![1.0, 2.0]], 1).is_none());
    }

    #[test]
    fn truncated_pads_with_zeros() {
        let mut m = HourlyMatrix::zeros(2, 1);
        m.set(1, 0, 7.0);
        let t = m.truncated(3);
        assert_eq!(t.column(0), vec![0.0, 7.0, 0.0]);
        assert_eq!(m.truncated(1).column(0), vec![0.0]);
    }

    #[test]
    fn map_in_place_visits_cells_in_hour_major_order() {
        let mut m = HourlyMatrix::zeros(2, 2);
        let mut next = 0.0;
        m.map_in_place(|v| {
            next += 1.0;
            v + next
        });
        assert_eq!(m.row(0), &[1.0, 2.0]);
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_panics() {
        HourlyMatrix::zeros(1, 1).get(1, 0);
    }
}
