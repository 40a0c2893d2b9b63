// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Lookup tables for the one- and two-qubit Clifford groups.
//!
//! The tables are used by randomized-benchmarking sequence generators. They
//! are computed once, on first use of [`tables()`], and are immutable afterwards.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::str::FromStr;
use std::sync::LazyLock;

use ndarray::{Array2, array, linalg::kron};
use num_complex::Complex64;

/// Dense complex unitary.
pub type ComplexMatrix = Array2<Complex64>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Clifford index {index} is out of range for {num_qubits} qubit(s).")]
    InvalidIndex { index: usize, num_qubits: usize },

    #[error("Only one- and two-qubit Cliffords are supported, got {0} qubits.")]
    UnsupportedQubitCount(usize),

    #[error("Expected a 2x2 or 4x4 matrix, got dimension {0}.")]
    UnsupportedDimension(usize),

    #[error("Entangling gate must be one of: CNOT, iSWAP, SWAP. Got '{0}'.")]
    UnknownEntangler(String),

    #[error("Could not find the inverse Clifford.")]
    InverseNotFound,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T: std::fmt::Display>(msg: T) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Number of single-qubit Cliffords.
pub const NUM_C1: usize = 24;

/// Single-qubit Cliffords that can be played directly: Id, X90, X90m, Y90, Y90m, X, Y.
pub const GENERATOR_PULSES: [usize; 7] = [0, 1, 3, 4, 6, 2, 5];

/// Single-qubit Cliffords forming the `S` group (rotations by n·2π/3 about X+Y+Z).
pub const S_GROUP: [usize; 3] = [0, 16, 17];

/// Longest generator sequence considered when decomposing single-qubit Cliffords.
const MAX_GENERATOR_SEQUENCE_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entangler {
    /// Echoed cross-resonance gate standing in for a CNOT
    Cnot,
    Iswap,
    Swap,
}

impl FromStr for Entangler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CNOT" => Ok(Entangler::Cnot),
            "iSWAP" => Ok(Entangler::Iswap),
            "SWAP" => Ok(Entangler::Swap),
            other => Err(Error::UnknownEntangler(other.to_string())),
        }
    }
}

/// A two-qubit Clifford written as `(S1 ⊗ S2) · E · (C1 ⊗ C2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TwoQubitClifford {
    pub singles: (usize, usize),
    pub entangler: Option<Entangler>,
    pub s_gates: Option<(usize, usize)>,
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn pauli_x() -> ComplexMatrix {
    array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]
}

fn pauli_y() -> ComplexMatrix {
    array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]]
}

fn pauli_z() -> ComplexMatrix {
    array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]]
}

/// Conjugate transpose.
pub fn adjoint(matrix: &ComplexMatrix) -> ComplexMatrix {
    matrix.t().mapv(|x| x.conj())
}

/// `|tr(a · b)|`, which equals the dimension iff `b` undoes `a` up to a global phase.
fn overlap(a: &ComplexMatrix, b: &ComplexMatrix) -> f64 {
    a.dot(b).diag().sum().norm()
}

/// `exp(-i θ n·σ)` for the unit vector along `axis`.
fn rotation(theta: f64, axis: [f64; 3]) -> ComplexMatrix {
    let norm = axis.iter().map(|x| x * x).sum::<f64>().sqrt();
    let generator = pauli_x() * c(axis[0] / norm, 0.0)
        + pauli_y() * c(axis[1] / norm, 0.0)
        + pauli_z() * c(axis[2] / norm, 0.0);
    ComplexMatrix::eye(2) * c(theta.cos(), 0.0) + generator * c(0.0, -theta.sin())
}

fn single_qubit_cliffords() -> Vec<ComplexMatrix> {
    const X: [f64; 3] = [1.0, 0.0, 0.0];
    const Y: [f64; 3] = [0.0, 1.0, 0.0];
    const Z: [f64; 3] = [0.0, 0.0, 1.0];
    let mut out = vec![ComplexMatrix::eye(2)];
    for axis in [X, Y, Z] {
        for k in 1..=3 {
            out.push(rotation(k as f64 * PI / 4.0, axis));
        }
    }
    for axis in [
        [1.0, 1.0, 0.0],
        [1.0, -1.0, 0.0],
        [1.0, 0.0, 1.0],
        [1.0, 0.0, -1.0],
        [0.0, 1.0, 1.0],
        [0.0, 1.0, -1.0],
    ] {
        out.push(rotation(PI / 2.0, axis));
    }
    for axis in [
        [1.0, 1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, 1.0],
    ] {
        out.push(rotation(PI / 3.0, axis));
        out.push(rotation(2.0 * PI / 3.0, axis));
    }
    debug_assert_eq!(out.len(), NUM_C1);
    out
}

/// Echoed cross-resonance unitary `exp(i π/4 X⊗Z)`.
fn echo_cr() -> ComplexMatrix {
    let xz = kron(&pauli_x(), &pauli_z());
    ComplexMatrix::eye(4) * c(FRAC_1_SQRT_2, 0.0) + xz * c(0.0, FRAC_1_SQRT_2)
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

/// All `n`-qubit Pauli matrices, ordered as the Kronecker products of `[I, X, Y, Z]`.
pub fn pauli_matrices(n: usize) -> Result<Vec<ComplexMatrix>> {
    if n == 0 {
        return Err(Error::new("You need at least 1 qubit."));
    }
    let single = [ComplexMatrix::eye(2), pauli_x(), pauli_y(), pauli_z()];
    if n == 1 {
        return Ok(single.to_vec());
    }
    let rest = pauli_matrices(n - 1)?;
    Ok(single
        .iter()
        .flat_map(|p1| rest.iter().map(move |p2| kron(p1, p2)))
        .collect())
}

/// Precomputed Clifford group tables.
pub struct CliffordTables {
    single: Vec<ComplexMatrix>,
    multiplication: [[u8; NUM_C1]; NUM_C1],
    generator_sequences: Vec<Vec<usize>>,
    minimal_sequences: Vec<Vec<Vec<usize>>>,
    two_qubit: Vec<TwoQubitClifford>,
    echo_cr: ComplexMatrix,
}

impl Default for CliffordTables {
    fn default() -> Self {
        Self::new()
    }
}

impl CliffordTables {
    pub fn new() -> Self {
        let single = single_qubit_cliffords();
        let multiplication = build_multiplication_table(&single);
        let generator_sequences = build_generator_sequences();
        let minimal_sequences = build_minimal_sequences(&generator_sequences, &multiplication);
        CliffordTables {
            single,
            multiplication,
            generator_sequences,
            minimal_sequences,
            two_qubit: build_two_qubit_cliffords(),
            echo_cr: echo_cr(),
        }
    }

    fn check_c1(index: usize) -> Result<()> {
        if index >= NUM_C1 {
            return Err(Error::InvalidIndex {
                index,
                num_qubits: 1,
            });
        }
        Ok(())
    }

    pub fn single_qubit(&self, index: usize) -> Result<&ComplexMatrix> {
        Self::check_c1(index)?;
        Ok(&self.single[index])
    }

    /// Index of the Clifford `C[c2] · C[c1]`, i.e. `c1` applied first.
    pub fn multiply(&self, c1: usize, c2: usize) -> Result<usize> {
        Self::check_c1(c1)?;
        Self::check_c1(c2)?;
        Ok(self.multiplication[c1][c2] as usize)
    }

    /// Generator sequences of length 1 to 3, shortest first.
    pub fn generator_sequences(&self) -> &[Vec<usize>] {
        &self.generator_sequences
    }

    /// All shortest generator sequences implementing the single-qubit Clifford `index`.
    pub fn minimal_sequences(&self, index: usize) -> Result<&[Vec<usize>]> {
        Self::check_c1(index)?;
        Ok(&self.minimal_sequences[index])
    }

    pub fn two_qubit_cliffords(&self) -> &[TwoQubitClifford] {
        &self.two_qubit
    }

    pub fn entangling_matrix(&self, gate: Entangler) -> ComplexMatrix {
        let echo_cr = &self.echo_cr;
        let y90m_pair = kron(&self.single[6], &self.single[6]);
        match gate {
            Entangler::Cnot => echo_cr.clone(),
            Entangler::Iswap => echo_cr.dot(&y90m_pair).dot(echo_cr),
            Entangler::Swap => {
                let x90_y90m = self.single[6].dot(&self.single[1]);
                let corrections = kron(&x90_y90m, &self.single[1]);
                echo_cr
                    .dot(&corrections)
                    .dot(echo_cr)
                    .dot(&y90m_pair)
                    .dot(echo_cr)
            }
        }
    }

    /// Unitary implementing the Clifford `index` on `num_qubits` qubits.
    pub fn clifford_matrix(&self, index: usize, num_qubits: usize) -> Result<ComplexMatrix> {
        match num_qubits {
            1 => self.single_qubit(index).cloned(),
            2 => {
                let clifford = self.two_qubit.get(index).ok_or(Error::InvalidIndex {
                    index,
                    num_qubits,
                })?;
                Ok(self.two_qubit_matrix(clifford))
            }
            n => Err(Error::UnsupportedQubitCount(n)),
        }
    }

    fn two_qubit_matrix(&self, clifford: &TwoQubitClifford) -> ComplexMatrix {
        let (c1, c2) = clifford.singles;
        let mut mat = kron(&self.single[c1], &self.single[c2]);
        if let Some(gate) = clifford.entangler {
            mat = self.entangling_matrix(gate).dot(&mat);
        }
        if let Some((s1, s2)) = clifford.s_gates {
            mat = kron(&self.single[s1], &self.single[s2]).dot(&mat);
        }
        mat
    }

    /// Index of the Clifford that undoes `matrix` up to a global phase.
    pub fn inverse_clifford(&self, matrix: &ComplexMatrix) -> Result<usize> {
        let dim = matrix.nrows();
        if matrix.ncols() != dim {
            return Err(Error::UnsupportedDimension(dim));
        }
        let overlaps_identity =
            |candidate: &ComplexMatrix| is_close(overlap(matrix, candidate), dim as f64);
        let found = match dim {
            2 => self.single.iter().position(overlaps_identity),
            4 => self
                .two_qubit
                .iter()
                .position(|clifford| overlaps_identity(&self.two_qubit_matrix(clifford))),
            _ => return Err(Error::UnsupportedDimension(dim)),
        };
        found.ok_or(Error::InverseNotFound)
    }
}

fn build_multiplication_table(single: &[ComplexMatrix]) -> [[u8; NUM_C1]; NUM_C1] {
    let mut table = [[0u8; NUM_C1]; NUM_C1];
    for (c1, row) in table.iter_mut().enumerate() {
        for (c2, entry) in row.iter_mut().enumerate() {
            let product = adjoint(&single[c2].dot(&single[c1]));
            let mut best = (0, f64::NEG_INFINITY);
            for (x, candidate) in single.iter().enumerate() {
                let score = overlap(&product, candidate);
                if score > best.1 {
                    best = (x, score);
                }
            }
            *entry = best.0 as u8;
        }
    }
    table
}

fn build_generator_sequences() -> Vec<Vec<usize>> {
    let mut out = vec![];
    let mut previous: Vec<Vec<usize>> = vec![vec![]];
    for _ in 0..MAX_GENERATOR_SEQUENCE_LENGTH {
        let current: Vec<Vec<usize>> = previous
            .iter()
            .flat_map(|prefix| {
                GENERATOR_PULSES.iter().map(move |pulse| {
                    let mut seq = prefix.clone();
                    seq.push(*pulse);
                    seq
                })
            })
            .collect();
        out.extend(current.iter().cloned());
        previous = current;
    }
    out
}

fn reduce_sequence(sequence: &[usize], table: &[[u8; NUM_C1]; NUM_C1]) -> Option<usize> {
    let (first, rest) = sequence.split_first()?;
    Some(
        rest.iter()
            .fold(*first, |acc, next| table[acc][*next] as usize),
    )
}

fn build_minimal_sequences(
    generator_sequences: &[Vec<usize>],
    table: &[[u8; NUM_C1]; NUM_C1],
) -> Vec<Vec<Vec<usize>>> {
    let reduced: Vec<Option<usize>> = generator_sequences
        .iter()
        .map(|seq| reduce_sequence(seq, table))
        .collect();
    (0..NUM_C1)
        .map(|clifford| {
            let matching: Vec<&Vec<usize>> = generator_sequences
                .iter()
                .zip(reduced.iter())
                .filter(|(_, r)| **r == Some(clifford))
                .map(|(seq, _)| seq)
                .collect();
            let Some(min_length) = matching.first().map(|seq| seq.len()) else {
                return vec![];
            };
            matching
                .into_iter()
                .filter(|seq| seq.len() == min_length)
                .cloned()
                .collect()
        })
        .collect()
}

fn build_two_qubit_cliffords() -> Vec<TwoQubitClifford> {
    let pairs: Vec<(usize, usize)> = (0..NUM_C1)
        .flat_map(|c1| (0..NUM_C1).map(move |c2| (c1, c2)))
        .collect();
    let s_pairs: Vec<(usize, usize)> = S_GROUP
        .iter()
        .flat_map(|s1| S_GROUP.iter().map(move |s2| (*s1, *s2)))
        .collect();

    let mut out = Vec::with_capacity(pairs.len() * (2 + 2 * s_pairs.len()));
    out.extend(pairs.iter().map(|singles| TwoQubitClifford {
        singles: *singles,
        entangler: None,
        s_gates: None,
    }));
    for gate in [Entangler::Cnot, Entangler::Iswap] {
        for singles in pairs.iter() {
            for s_gates in s_pairs.iter() {
                out.push(TwoQubitClifford {
                    singles: *singles,
                    entangler: Some(gate),
                    s_gates: Some(*s_gates),
                });
            }
        }
    }
    out.extend(pairs.iter().map(|singles| TwoQubitClifford {
        singles: *singles,
        entangler: Some(Entangler::Swap),
        s_gates: None,
    }));
    out
}

static TABLES: LazyLock<CliffordTables> = LazyLock::new(CliffordTables::new);

/// Process-wide Clifford tables, built on first access.
pub fn tables() -> &'static CliffordTables {
    &TABLES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unitary(matrix: &ComplexMatrix, tolerance: f64) -> bool {
        let product = matrix.dot(&adjoint(matrix));
        product
            .iter()
            .zip(ComplexMatrix::eye(matrix.nrows()).iter())
            .all(|(a, b)| (a - b).norm() <= tolerance)
    }

    #[test]
    fn test_single_qubit_cliffords_are_unitary() {
        let tables = tables();
        for index in 0..NUM_C1 {
            assert!(is_unitary(tables.single_qubit(index).unwrap(), 1e-12));
        }
        assert!(tables.single_qubit(NUM_C1).is_err());
    }

    #[test]
    fn test_multiplication_identity() {
        let tables = tables();
        for x in 0..NUM_C1 {
            assert_eq!(tables.multiply(0, x).unwrap(), x);
            assert_eq!(tables.multiply(x, 0).unwrap(), x);
        }
    }

    #[test]
    fn test_multiplication_known_products() {
        let tables = tables();
        // X90 · X90 = X
        assert_eq!(tables.multiply(1, 1).unwrap(), 2);
        // X90 then X90m is the identity up to a global phase
        assert_eq!(tables.multiply(1, 3).unwrap(), 0);
        // Y · Y
        assert_eq!(tables.multiply(5, 5).unwrap(), 0);
    }

    #[test]
    fn test_multiplication_rows_are_permutations() {
        let tables = tables();
        for c1 in 0..NUM_C1 {
            let mut row: Vec<usize> = (0..NUM_C1)
                .map(|c2| tables.multiply(c1, c2).unwrap())
                .collect();
            row.sort();
            assert_eq!(row, (0..NUM_C1).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_generator_sequences() {
        let sequences = tables().generator_sequences();
        assert_eq!(sequences.len(), 7 + 49 + 343);
        assert_eq!(sequences[0], vec![0]);
        assert_eq!(sequences[7], vec![0, 0]);
        assert_eq!(sequences[8], vec![0, 1]);
    }

    #[test]
    fn test_minimal_sequences() {
        let tables = tables();
        for generator in GENERATOR_PULSES {
            assert_eq!(
                tables.minimal_sequences(generator).unwrap(),
                &[vec![generator]]
            );
        }
        for clifford in 0..NUM_C1 {
            let sequences = tables.minimal_sequences(clifford).unwrap();
            assert!(!sequences.is_empty());
            let length = sequences[0].len();
            for seq in sequences {
                assert_eq!(seq.len(), length);
                assert_eq!(
                    reduce_sequence(seq, &tables.multiplication),
                    Some(clifford)
                );
            }
        }
    }

    #[test]
    fn test_two_qubit_enumeration() {
        let cliffords = tables().two_qubit_cliffords();
        assert_eq!(cliffords.len(), 11520);
        assert_eq!(
            cliffords[0],
            TwoQubitClifford {
                singles: (0, 0),
                entangler: None,
                s_gates: None
            }
        );
        assert_eq!(cliffords[576].entangler, Some(Entangler::Cnot));
        assert_eq!(cliffords[576].s_gates, Some((0, 0)));
        assert_eq!(cliffords[577].s_gates, Some((0, 16)));
        assert_eq!(cliffords[11519].entangler, Some(Entangler::Swap));
    }

    #[test]
    fn test_clifford_matrix() {
        let tables = tables();
        assert_eq!(tables.clifford_matrix(0, 2).unwrap(), ComplexMatrix::eye(4));
        for index in [1, 600, 5000, 11000] {
            assert!(is_unitary(&tables.clifford_matrix(index, 2).unwrap(), 1e-9));
        }
        assert!(tables.clifford_matrix(11520, 2).is_err());
        assert!(matches!(
            tables.clifford_matrix(0, 3),
            Err(Error::UnsupportedQubitCount(3))
        ));
    }

    #[test]
    fn test_entangling_matrices_are_unitary() {
        let tables = tables();
        for gate in ["CNOT", "iSWAP", "SWAP"] {
            let gate: Entangler = gate.parse().unwrap();
            assert!(is_unitary(&tables.entangling_matrix(gate), 1e-9));
        }
        assert!(matches!(
            "CZ".parse::<Entangler>(),
            Err(Error::UnknownEntangler(_))
        ));
    }

    #[test]
    fn test_inverse_single_qubit() {
        let tables = tables();
        // X90m undoes X90
        let x90 = tables.single_qubit(1).unwrap();
        assert_eq!(tables.inverse_clifford(x90).unwrap(), 3);
        assert_eq!(tables.inverse_clifford(&ComplexMatrix::eye(2)).unwrap(), 0);
    }

    #[test]
    fn test_inverse_two_qubit() {
        let tables = tables();
        assert_eq!(tables.inverse_clifford(&ComplexMatrix::eye(4)).unwrap(), 0);
        // Local Cliffords are closed under inversion within the enumeration
        for index in [17, 300, 575] {
            let mat = tables.clifford_matrix(index, 2).unwrap();
            let inverse = tables.inverse_clifford(&mat).unwrap();
            let inverse_mat = tables.clifford_matrix(inverse, 2).unwrap();
            assert!(is_close(overlap(&mat, &inverse_mat), 4.0));
        }
    }

    #[test]
    fn test_inverse_unsupported_dimension() {
        assert!(matches!(
            tables().inverse_clifford(&ComplexMatrix::eye(3)),
            Err(Error::UnsupportedDimension(3))
        ));
        assert!(matches!(
            tables().inverse_clifford(&ComplexMatrix::zeros((2, 4))),
            Err(Error::UnsupportedDimension(2))
        ));
    }

    #[test]
    fn test_adjoint() {
        let m = array![[c(1.0, 2.0), c(0.0, -1.0)], [c(3.0, 0.0), c(0.5, 0.5)]];
        let expected = array![[c(1.0, -2.0), c(3.0, 0.0)], [c(0.0, 1.0), c(0.5, -0.5)]];
        assert_eq!(adjoint(&m), expected);
        // Y is Hermitian, its adjoint is itself
        assert_eq!(adjoint(&pauli_y()), pauli_y());
        assert!(is_close(overlap(&pauli_y(), &pauli_y()), 2.0));
    }

    #[test]
    fn test_pauli_matrices() {
        assert_eq!(pauli_matrices(1).unwrap().len(), 4);
        let two = pauli_matrices(2).unwrap();
        assert_eq!(two.len(), 16);
        assert_eq!(two[0], ComplexMatrix::eye(4));
        assert!(pauli_matrices(0).is_err());
    }
}
