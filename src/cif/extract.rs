//! Typed mmCIF views.
//!
//! [`mmcif_schema`] declares the categories this crate knows about. Mapping it
//! over a [`Block`] yields a [`Database`]; each extractor here implements
//! `TryFrom<&Database>` and picks typed columns out of it. Nothing is copied
//! until a value is read.

use glam::Vec3;

use crate::column::{Column, ValueKind};
use crate::dom::Block;
use crate::error::DecodeError;
use crate::schema::{map_schema, Database, Schema, Table};

/// Schema for the coordinate categories of an mmCIF block.
pub fn mmcif_schema() -> Schema {
    Schema::new()
        .category("atom_site", |c| {
            c.str("group_PDB")
                .int("id")
                .str("type_symbol")
                .str("label_atom_id")
                .str("label_alt_id")
                .str("label_comp_id")
                .str("label_asym_id")
                .int("label_seq_id")
                .str("pdbx_PDB_ins_code")
                .float("Cartn_x")
                .float("Cartn_y")
                .float("Cartn_z")
                .float("occupancy")
                .float("B_iso_or_equiv")
                .int("auth_seq_id")
                .str("auth_asym_id")
                .int("pdbx_PDB_model_num")
        })
        .category("cell", |c| {
            c.float("length_a")
                .float("length_b")
                .float("length_c")
                .float("angle_alpha")
                .float("angle_beta")
                .float("angle_gamma")
        })
        .category("symmetry", |c| c.str("space_group_name_H-M"))
        .category("space_group", |c| c.str("name_H-M_alt"))
}

/// Unit cell parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Column views over the `_atom_site` category.
#[derive(Debug, Clone, Copy)]
pub struct AtomSites<'a> {
    pub count: usize,
    /// `ATOM` or `HETATM`.
    pub group: Column<'a, String>,
    pub id: Column<'a, i32>,
    /// Element symbol (e.g. `C`, `N`, `O`).
    pub element: Column<'a, String>,
    /// Atom name (e.g. `CA`, `N`, `OG1`).
    pub label: Column<'a, String>,
    pub residue: Column<'a, String>,
    pub chain: Column<'a, String>,
    pub seq_id: Column<'a, i32>,
    pub x: Column<'a, f64>,
    pub y: Column<'a, f64>,
    pub z: Column<'a, f64>,
    pub occupancy: Column<'a, f64>,
    pub b_factor: Column<'a, f64>,
    pub model: Column<'a, i32>,
    pub alt_id: Column<'a, String>,
    pub insertion_code: Column<'a, String>,
    /// Author residue number and chain, as printed in the PDB file.
    pub auth_seq_id: Column<'a, i32>,
    pub auth_chain: Column<'a, String>,
}

fn present_str<'a>(column: &Column<'a, String>, row: usize) -> Option<&'a str> {
    (column.value_kind(row) == ValueKind::Present).then(|| column.str_value(row))
}

fn present_int(column: &Column<'_, i32>, row: usize) -> Option<i32> {
    (column.value_kind(row) == ValueKind::Present).then(|| column.value(row))
}

impl<'a> AtomSites<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Record group, `ATOM` when not given.
    pub fn group(&self, row: usize) -> &'a str {
        match self.group.value_kind(row) {
            ValueKind::Present => self.group.str_value(row),
            _ => "ATOM",
        }
    }

    pub fn seq_id(&self, row: usize) -> Option<i32> {
        present_int(&self.seq_id, row)
    }

    /// Alternate location indicator; `None` for `.`.
    pub fn alt_id(&self, row: usize) -> Option<&'a str> {
        present_str(&self.alt_id, row)
    }

    pub fn insertion_code(&self, row: usize) -> Option<&'a str> {
        present_str(&self.insertion_code, row)
    }

    /// Author residue number, falling back to the label sequence id.
    pub fn auth_seq_id(&self, row: usize) -> Option<i32> {
        present_int(&self.auth_seq_id, row).or_else(|| self.seq_id(row))
    }

    /// Author chain id, falling back to the label chain.
    pub fn auth_chain(&self, row: usize) -> &'a str {
        present_str(&self.auth_chain, row).unwrap_or_else(|| self.chain.str_value(row))
    }

    /// Model number, 1 when not given.
    pub fn model_number(&self, row: usize) -> i32 {
        present_int(&self.model, row).unwrap_or(1)
    }

    /// Occupancy, 1.0 when not given.
    pub fn occupancy(&self, row: usize) -> f64 {
        match self.occupancy.value_kind(row) {
            ValueKind::Present => self.occupancy.value(row),
            _ => 1.0,
        }
    }

    pub fn b_factor(&self, row: usize) -> f64 {
        self.b_factor.value(row)
    }

    pub fn position(&self, row: usize) -> Vec3 {
        Vec3::new(
            self.x.value(row) as f32,
            self.y.value(row) as f32,
            self.z.value(row) as f32,
        )
    }

    pub fn positions(&self) -> Vec<Vec3> {
        (0..self.count).map(|row| self.position(row)).collect()
    }

    /// Check the coordinate columns for unparsable values.
    pub fn validate(&self) -> Result<(), DecodeError> {
        [("Cartn_x", &self.x), ("Cartn_y", &self.y), ("Cartn_z", &self.z)]
            .into_iter()
            .try_for_each(|(name, column)| {
                column.validate().map_err(|e| e.in_field("atom_site", name))
            })
    }
}

/// Coordinate data extracted from an mmCIF block.
#[derive(Debug, Clone)]
pub struct CoordinateData<'a> {
    pub atoms: AtomSites<'a>,
    pub cell: Option<UnitCell>,
    pub spacegroup: Option<String>,
}

/// Errors from typed extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("missing category: {0}")]
    MissingCategory(String),
    #[error("missing required tag: {0}")]
    MissingTag(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Map [`mmcif_schema`] over `block` and extract its coordinates.
///
/// Fails when any `Cartn_x/y/z` value does not parse as a number.
pub fn extract_coordinates<'a>(block: &'a Block<'_>) -> Result<CoordinateData<'a>, ExtractionError> {
    let db = map_schema(&mmcif_schema(), block)?;
    let coordinates = CoordinateData::try_from(&db)?;
    coordinates.atoms.validate()?;
    Ok(coordinates)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn present_table<'d, 'a>(db: &'d Database<'a>, name: &str) -> Option<&'d Table<'a>> {
    db.table(name).filter(|t| t.is_present())
}

fn first_str(db: &Database<'_>, category: &str, field: &str) -> Option<String> {
    let column = present_table(db, category)?.str(field).ok()?;
    match column.value_kind(0) {
        ValueKind::Present => Some(column.str_value(0).to_string()),
        _ => None,
    }
}

fn extract_spacegroup(db: &Database<'_>) -> Option<String> {
    first_str(db, "symmetry", "space_group_name_H-M")
        .or_else(|| first_str(db, "space_group", "name_H-M_alt"))
}

// ---------------------------------------------------------------------------
// TryFrom impls
// ---------------------------------------------------------------------------

impl TryFrom<&Database<'_>> for UnitCell {
    type Error = ExtractionError;

    fn try_from(db: &Database<'_>) -> Result<Self, Self::Error> {
        let missing = || ExtractionError::MissingTag("_cell.length_*".into());
        let table = present_table(db, "cell").ok_or_else(missing)?;
        let read = |name: &str| -> Result<f64, ExtractionError> {
            let column = table.float(name)?;
            if column.row_count() == 0 || column.value_kind(0) != ValueKind::Present {
                return Err(missing());
            }
            Ok(column.try_value(0).map_err(|e| e.in_field("cell", name))?)
        };
        Ok(UnitCell {
            a: read("length_a")?,
            b: read("length_b")?,
            c: read("length_c")?,
            alpha: read("angle_alpha")?,
            beta: read("angle_beta")?,
            gamma: read("angle_gamma")?,
        })
    }
}

impl<'a> TryFrom<&Database<'a>> for AtomSites<'a> {
    type Error = ExtractionError;

    fn try_from(db: &Database<'a>) -> Result<Self, Self::Error> {
        let table = present_table(db, "atom_site")
            .ok_or_else(|| ExtractionError::MissingCategory("_atom_site".into()))?;

        for required in [
            "label_atom_id",
            "label_comp_id",
            "label_asym_id",
            "Cartn_x",
            "Cartn_y",
            "Cartn_z",
        ] {
            if !table.column(required).is_some_and(|c| c.is_defined()) {
                return Err(ExtractionError::MissingTag(format!("_atom_site.{required}")));
            }
        }

        Ok(AtomSites {
            count: table.row_count(),
            group: table.str("group_PDB")?,
            id: table.int("id")?,
            element: table.str("type_symbol")?,
            label: table.str("label_atom_id")?,
            residue: table.str("label_comp_id")?,
            chain: table.str("label_asym_id")?,
            seq_id: table.int("label_seq_id")?,
            x: table.float("Cartn_x")?,
            y: table.float("Cartn_y")?,
            z: table.float("Cartn_z")?,
            occupancy: table.float("occupancy")?,
            b_factor: table.float("B_iso_or_equiv")?,
            model: table.int("pdbx_PDB_model_num")?,
            alt_id: table.str("label_alt_id")?,
            insertion_code: table.str("pdbx_PDB_ins_code")?,
            auth_seq_id: table.int("auth_seq_id")?,
            auth_chain: table.str("auth_asym_id")?,
        })
    }
}

impl<'a> TryFrom<&Database<'a>> for CoordinateData<'a> {
    type Error = ExtractionError;

    fn try_from(db: &Database<'a>) -> Result<Self, Self::Error> {
        Ok(CoordinateData {
            atoms: AtomSites::try_from(db)?,
            cell: UnitCell::try_from(db).ok(),
            spacegroup: extract_spacegroup(db),
        })
    }
}
