//! Read-only chemical species reference data.
//!
//! Masses are standard atomic weights in unified atomic mass units. The engine only
//! needs masses (temperature derivation) and symbols (labels for species buckets), so
//! any other source of reference data can be plugged in through [`SpeciesTable`].

use phf::{Map, phf_map};

/// Lookup of per-species reference data, keyed by atomic number.
pub trait SpeciesTable: Send + Sync {
    /// Atomic mass in unified atomic mass units.
    fn mass(&self, znucl: u32) -> Option<f64>;

    /// Chemical symbol used for display purposes only.
    fn name(&self, znucl: u32) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub mass: f64,
}

static ELEMENTS: Map<u32, Element> = phf_map! {
    1u32 => Element { symbol: "H", mass: 1.008 },
    2u32 => Element { symbol: "He", mass: 4.002602 },
    3u32 => Element { symbol: "Li", mass: 6.94 },
    4u32 => Element { symbol: "Be", mass: 9.0121831 },
    5u32 => Element { symbol: "B", mass: 10.81 },
    6u32 => Element { symbol: "C", mass: 12.011 },
    7u32 => Element { symbol: "N", mass: 14.007 },
    8u32 => Element { symbol: "O", mass: 15.999 },
    9u32 => Element { symbol: "F", mass: 18.998403163 },
    10u32 => Element { symbol: "Ne", mass: 20.1797 },
    11u32 => Element { symbol: "Na", mass: 22.98976928 },
    12u32 => Element { symbol: "Mg", mass: 24.305 },
    13u32 => Element { symbol: "Al", mass: 26.9815385 },
    14u32 => Element { symbol: "Si", mass: 28.085 },
    15u32 => Element { symbol: "P", mass: 30.973761998 },
    16u32 => Element { symbol: "S", mass: 32.06 },
    17u32 => Element { symbol: "Cl", mass: 35.45 },
    18u32 => Element { symbol: "Ar", mass: 39.948 },
    19u32 => Element { symbol: "K", mass: 39.0983 },
    20u32 => Element { symbol: "Ca", mass: 40.078 },
    21u32 => Element { symbol: "Sc", mass: 44.955908 },
    22u32 => Element { symbol: "Ti", mass: 47.867 },
    23u32 => Element { symbol: "V", mass: 50.9415 },
    24u32 => Element { symbol: "Cr", mass: 51.9961 },
    25u32 => Element { symbol: "Mn", mass: 54.938044 },
    26u32 => Element { symbol: "Fe", mass: 55.845 },
    27u32 => Element { symbol: "Co", mass: 58.933194 },
    28u32 => Element { symbol: "Ni", mass: 58.6934 },
    29u32 => Element { symbol: "Cu", mass: 63.546 },
    30u32 => Element { symbol: "Zn", mass: 65.38 },
    31u32 => Element { symbol: "Ga", mass: 69.723 },
    32u32 => Element { symbol: "Ge", mass: 72.630 },
    33u32 => Element { symbol: "As", mass: 74.921595 },
    34u32 => Element { symbol: "Se", mass: 78.971 },
    35u32 => Element { symbol: "Br", mass: 79.904 },
    36u32 => Element { symbol: "Kr", mass: 83.798 },
    37u32 => Element { symbol: "Rb", mass: 85.4678 },
    38u32 => Element { symbol: "Sr", mass: 87.62 },
    39u32 => Element { symbol: "Y", mass: 88.90584 },
    40u32 => Element { symbol: "Zr", mass: 91.224 },
    41u32 => Element { symbol: "Nb", mass: 92.90637 },
    42u32 => Element { symbol: "Mo", mass: 95.95 },
    43u32 => Element { symbol: "Tc", mass: 98.0 },
    44u32 => Element { symbol: "Ru", mass: 101.07 },
    45u32 => Element { symbol: "Rh", mass: 102.90550 },
    46u32 => Element { symbol: "Pd", mass: 106.42 },
    47u32 => Element { symbol: "Ag", mass: 107.8682 },
    48u32 => Element { symbol: "Cd", mass: 112.414 },
    49u32 => Element { symbol: "In", mass: 114.818 },
    50u32 => Element { symbol: "Sn", mass: 118.710 },
    51u32 => Element { symbol: "Sb", mass: 121.760 },
    52u32 => Element { symbol: "Te", mass: 127.60 },
    53u32 => Element { symbol: "I", mass: 126.90447 },
    54u32 => Element { symbol: "Xe", mass: 131.293 },
    55u32 => Element { symbol: "Cs", mass: 132.90545196 },
    56u32 => Element { symbol: "Ba", mass: 137.327 },
    57u32 => Element { symbol: "La", mass: 138.90547 },
    58u32 => Element { symbol: "Ce", mass: 140.116 },
    59u32 => Element { symbol: "Pr", mass: 140.90766 },
    60u32 => Element { symbol: "Nd", mass: 144.242 },
    61u32 => Element { symbol: "Pm", mass: 145.0 },
    62u32 => Element { symbol: "Sm", mass: 150.36 },
    63u32 => Element { symbol: "Eu", mass: 151.964 },
    64u32 => Element { symbol: "Gd", mass: 157.25 },
    65u32 => Element { symbol: "Tb", mass: 158.92535 },
    66u32 => Element { symbol: "Dy", mass: 162.500 },
    67u32 => Element { symbol: "Ho", mass: 164.93033 },
    68u32 => Element { symbol: "Er", mass: 167.259 },
    69u32 => Element { symbol: "Tm", mass: 168.93422 },
    70u32 => Element { symbol: "Yb", mass: 173.045 },
    71u32 => Element { symbol: "Lu", mass: 174.9668 },
    72u32 => Element { symbol: "Hf", mass: 178.49 },
    73u32 => Element { symbol: "Ta", mass: 180.94788 },
    74u32 => Element { symbol: "W", mass: 183.84 },
    75u32 => Element { symbol: "Re", mass: 186.207 },
    76u32 => Element { symbol: "Os", mass: 190.23 },
    77u32 => Element { symbol: "Ir", mass: 192.217 },
    78u32 => Element { symbol: "Pt", mass: 195.084 },
    79u32 => Element { symbol: "Au", mass: 196.966569 },
    80u32 => Element { symbol: "Hg", mass: 200.592 },
    81u32 => Element { symbol: "Tl", mass: 204.38 },
    82u32 => Element { symbol: "Pb", mass: 207.2 },
    83u32 => Element { symbol: "Bi", mass: 208.98040 },
    84u32 => Element { symbol: "Po", mass: 209.0 },
    85u32 => Element { symbol: "At", mass: 210.0 },
    86u32 => Element { symbol: "Rn", mass: 222.0 },
};

/// Built-in periodic table covering hydrogen through radon.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mendeleev;

impl Mendeleev {
    pub fn element(znucl: u32) -> Option<&'static Element> {
        ELEMENTS.get(&znucl)
    }
}

impl SpeciesTable for Mendeleev {
    fn mass(&self, znucl: u32) -> Option<f64> {
        Self::element(znucl).map(|e| e.mass)
    }

    fn name(&self, znucl: u32) -> Option<&str> {
        Self::element(znucl).map(|e| e.symbol)
    }
}

/// Labels of the species buckets: `"All"` first, then one symbol per species.
///
/// Unknown atomic numbers are labelled `Z<number>`.
pub fn bucket_labels(znucl: &[u32], table: &dyn SpeciesTable) -> Vec<String> {
    std::iter::once("All".to_string())
        .chain(znucl.iter().map(|&z| {
            table
                .name(z)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| format!("Z{z}"))
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_mass_and_symbol_for_known_elements() {
        let table = Mendeleev;
        assert_eq!(table.name(1), Some("H"));
        assert_eq!(table.name(14), Some("Si"));
        assert_eq!(table.mass(6), Some(12.011));
        assert_eq!(table.name(86), Some("Rn"));
    }

    #[test]
    fn lookup_returns_none_outside_the_table() {
        let table = Mendeleev;
        assert_eq!(table.mass(0), None);
        assert_eq!(table.name(118), None);
    }

    #[test]
    fn bucket_labels_start_with_all_and_follow_species_order() {
        let labels = bucket_labels(&[8, 1, 200], &Mendeleev);
        assert_eq!(labels, vec!["All", "O", "H", "Z200"]);
    }
}
