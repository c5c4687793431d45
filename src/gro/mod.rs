//! GROMACS `.gro` coordinate files.
//!
//! A file is a sequence of records: a title line, an atom count, one
//! fixed-column line per atom and a box line. [`parse`] indexes the lines
//! and exposes each record's atoms as a one-category [`Block`] of fixed-width
//! fields; [`GroStructure::atoms`] maps [`schema`] over it for typed access.

pub mod parse;

use glam::Vec3;

use crate::column::Column;
use crate::dom::Block;
use crate::error::DecodeError;
use crate::schema::{map_schema, Schema};

pub use parse::{parse, parse_with};

/// Name of the atom category inside every record block.
pub const ATOMS: &str = "atoms";

/// Decimal places of the position and velocity columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroPrecision {
    pub position: usize,
    /// Zero when the record has no velocities.
    pub velocity: usize,
}

impl Default for GroPrecision {
    fn default() -> Self {
        Self {
            position: 3,
            velocity: 0,
        }
    }
}

/// Per-record header.
#[derive(Debug, Clone, PartialEq)]
pub struct GroHeader {
    pub title: String,
    /// Simulation time from a `t=` marker in the title line.
    pub time_in_ps: Option<f64>,
    pub has_velocities: bool,
    pub precision: GroPrecision,
    /// Box edge lengths in nm (`v1(x) v2(y) v3(z)`).
    pub box_size: Vec3,
}

/// One record of a `.gro` file.
#[derive(Debug, Clone)]
pub struct GroStructure<'a> {
    pub header: GroHeader,
    pub block: Block<'a>,
}

impl GroStructure<'_> {
    pub fn atom_count(&self) -> usize {
        self.block.category(ATOMS).map_or(0, |c| c.row_count())
    }

    /// Typed atom columns. Velocity columns are undefined when the record
    /// has none.
    pub fn atoms(&self) -> Result<GroAtoms<'_>, DecodeError> {
        let db = map_schema(&schema(), &self.block)?;
        let missing = || DecodeError::UndeclaredField {
            category: ATOMS.to_string(),
            field: String::new(),
        };
        let table = db.table(ATOMS).ok_or_else(missing)?;
        Ok(GroAtoms {
            count: table.row_count(),
            residue_number: table.int("residue_number")?,
            residue_name: table.str("residue_name")?,
            atom_name: table.str("atom_name")?,
            atom_number: table.int("atom_number")?,
            x: table.float("x")?,
            y: table.float("y")?,
            z: table.float("z")?,
            vx: table.float("vx")?,
            vy: table.float("vy")?,
            vz: table.float("vz")?,
        })
    }
}

/// All records of a `.gro` file.
#[derive(Debug, Clone, Default)]
pub struct GroFile<'a> {
    pub structures: Vec<GroStructure<'a>>,
}

/// Schema of the atom category.
pub fn schema() -> Schema {
    Schema::new().category(ATOMS, |c| {
        c.int("residue_number")
            .str("residue_name")
            .str("atom_name")
            .int("atom_number")
            .float("x")
            .float("y")
            .float("z")
            .float("vx")
            .float("vy")
            .float("vz")
    })
}

/// Typed atom columns of one record.
#[derive(Debug, Clone, Copy)]
pub struct GroAtoms<'a> {
    pub count: usize,
    pub residue_number: Column<'a, i32>,
    pub residue_name: Column<'a, String>,
    pub atom_name: Column<'a, String>,
    pub atom_number: Column<'a, i32>,
    pub x: Column<'a, f64>,
    pub y: Column<'a, f64>,
    pub z: Column<'a, f64>,
    pub vx: Column<'a, f64>,
    pub vy: Column<'a, f64>,
    pub vz: Column<'a, f64>,
}

impl GroAtoms<'_> {
    /// Positions in nm.
    pub fn positions(&self) -> Vec<Vec3> {
        vectors(&self.x, &self.y, &self.z, self.count)
    }

    /// Velocities in nm/ps, `None` when the record has none.
    pub fn velocities(&self) -> Option<Vec<Vec3>> {
        self.vx
            .is_defined()
            .then(|| vectors(&self.vx, &self.vy, &self.vz, self.count))
    }
}

fn vectors(x: &Column<'_, f64>, y: &Column<'_, f64>, z: &Column<'_, f64>, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|row| Vec3::new(x.value(row) as f32, y.value(row) as f32, z.value(row) as f32))
        .collect()
}
