/// All physical fields of a single time step, as delivered by a loader.
///
/// Positions and velocities are flattened `[atom][xyz]` arrays in atomic units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// Cartesian coordinates, `3 * natom` values in Bohr.
    pub positions: Vec<f64>,
    /// Lattice vectors stored one after the other, in Bohr.
    pub rprimd: [f64; 9],
    /// Stress tensor in Voigt order (xx, yy, zz, yz, xz, xy), in Ha/Bohr^3.
    pub stress: [f64; 6],
    /// Simulation time in atomic time units.
    pub time: f64,
    /// Total energy in Hartree.
    pub etotal: f64,
    /// Molecular-dynamics quantities, when the source provides them.
    pub md: Option<FrameMd>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameMd {
    /// Cartesian velocities, `3 * natom` values in Bohr per atomic time unit.
    pub velocities: Option<Vec<f64>>,
    /// Kinetic energy in Hartree.
    pub ekin: f64,
    /// Temperature in Kelvin.
    pub temperature: f64,
    /// Pressure in GPa.
    pub pressure: f64,
    /// Electronic entropy.
    pub entropy: f64,
}

impl Frame {
    pub fn new(positions: Vec<f64>, rprimd: [f64; 9], time: f64) -> Self {
        Self {
            positions,
            rprimd,
            time,
            ..Default::default()
        }
    }

    pub fn with_stress(mut self, stress: [f64; 6]) -> Self {
        self.stress = stress;
        self
    }

    pub fn with_etotal(mut self, etotal: f64) -> Self {
        self.etotal = etotal;
        self
    }

    pub fn with_md(mut self, md: FrameMd) -> Self {
        self.md = Some(md);
        self
    }
}
