use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// Dense vector of `f64` components.
///
/// Binary operators require equal lengths and panic otherwise; a length mismatch between two
/// vectors of the same linear system is a programming error, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector {
    values: Vec<f64>,
}

impl Vector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        assert_same_len("dot", self, other);
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Component-wise (Hadamard) product.
    pub fn comp_product(&self, other: &Vector) -> Vector {
        assert_same_len("comp_product", self, other);
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .collect()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// `self += alpha * other`, without allocating.
    pub fn add_scaled(&mut self, alpha: f64, other: &Vector) {
        assert_same_len("add_scaled", self, other);
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += alpha * b;
        }
    }

    /// `self = other + beta * self`, the search-direction update of conjugate gradient.
    pub fn scale_and_add(&mut self, beta: f64, other: &Vector) {
        assert_same_len("scale_and_add", self, other);
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a = b + beta * *a;
        }
    }
}

fn assert_same_len(op: &str, a: &Vector, b: &Vector) {
    assert_eq!(
        a.len(),
        b.len(),
        "{op}: vector lengths differ ({} vs {})",
        a.len(),
        b.len()
    );
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<f64> for Vector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

impl Add<&Vector> for &Vector {
    type Output = Vector;

    fn add(self, rhs: &Vector) -> Vector {
        assert_same_len("add", self, rhs);
        self.values
            .iter()
            .zip(&rhs.values)
            .map(|(a, b)| a + b)
            .collect()
    }
}

impl Sub<&Vector> for &Vector {
    type Output = Vector;

    fn sub(self, rhs: &Vector) -> Vector {
        assert_same_len("sub", self, rhs);
        self.values
            .iter()
            .zip(&rhs.values)
            .map(|(a, b)| a - b)
            .collect()
    }
}

impl AddAssign<&Vector> for Vector {
    fn add_assign(&mut self, rhs: &Vector) {
        self.add_scaled(1.0, rhs);
    }
}

impl SubAssign<&Vector> for Vector {
    fn sub_assign(&mut self, rhs: &Vector) {
        self.add_scaled(-1.0, rhs);
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.values.iter().map(|v| v * rhs).collect()
    }
}

impl Mul<&Vector> for f64 {
    type Output = Vector;

    fn mul(self, rhs: &Vector) -> Vector {
        rhs * self
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.values.iter().map(|v| -v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_and_add_matches_the_operator_form() {
        let mut d = Vector::new(vec![1.0, -2.0, 0.5]);
        let r = Vector::new(vec![3.0, 1.0, -1.0]);
        let expected = &r + &(0.25 * &d);
        d.scale_and_add(0.25, &r);
        assert_eq!(d, expected);
    }
}
