use nalgebra::Matrix3;

/// Builds the lattice matrix of one frame from its nine stored components.
///
/// The components are stored vector by vector, so each lattice vector becomes a
/// column of the returned matrix.
pub fn lattice_matrix(rprimd: &[f64]) -> Matrix3<f64> {
    Matrix3::from_column_slice(&rprimd[..9])
}

/// Cell volume (signed determinant of the lattice matrix).
pub fn cell_volume(rprimd: &[f64]) -> f64 {
    lattice_matrix(rprimd).determinant()
}

/// Trace of a stress tensor stored in Voigt order (xx, yy, zz, yz, xz, xy).
#[inline]
pub fn stress_trace(stress: &[f64]) -> f64 {
    stress[0] + stress[1] + stress[2]
}
