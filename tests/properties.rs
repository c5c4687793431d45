use foldit_reader::{cif, gro, map_schema, Database, ElementType, Schema, TypedColumn, ValueKind};
use proptest::prelude::*;

fn quote(value: &str, style: u8) -> String {
    match style % 3 {
        0 => value.to_string(),
        1 => format!("'{value}'"),
        _ => format!("\"{value}\""),
    }
}

fn int_loop(values: &[i32], styles: &[u8]) -> String {
    let mut text = String::from("data_p\nloop_\n_t.v\n");
    for (value, style) in values.iter().zip(styles.iter().cycle()) {
        text.push_str(&quote(&value.to_string(), *style));
        text.push('\n');
    }
    text
}

fn gro_text(coords: &[(i32, i32, i32)]) -> String {
    let mut text = format!("random\n{:>5}\n", coords.len());
    for (i, (x, y, z)) in coords.iter().enumerate() {
        text.push_str(&format!(
            "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}\n",
            i / 3 + 1,
            "SOL",
            "OW",
            i + 1,
            f64::from(*x) / 1000.0,
            f64::from(*y) / 1000.0,
            f64::from(*z) / 1000.0,
        ));
    }
    text.push_str("   1.00000   1.00000   1.00000\n");
    text
}

fn row_schema() -> Schema {
    Schema::new()
        .category("row", |c| {
            c.int("id")
                .float("x")
                .str("name")
                .list("tags", ',', ElementType::Int)
                .str("absent")
        })
        .category("nowhere", |c| c.float("v"))
}

fn row_loop(rows: &[(i32, Option<i64>, String, Vec<u8>)]) -> String {
    let mut text = String::from("data_rows\nloop_\n_row.id\n_row.x\n_row.name\n_row.tags\n");
    for (id, x, name, tags) in rows {
        let x = x.map_or_else(|| "?".to_string(), |m| format!("{:.3}", m as f64 / 1000.0));
        let tags = if tags.is_empty() {
            ".".to_string()
        } else {
            tags.iter().map(u8::to_string).collect::<Vec<_>>().join(",")
        };
        text.push_str(&format!("{id} {x} '{name}' {tags}\n"));
    }
    text
}

/// Every declared column of every table, materialized.
fn snapshot(db: &Database<'_>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for table in db.tables() {
        for name in table.column_names() {
            let values = match table.column(name).expect("declared column") {
                TypedColumn::Int(c) => format!("{:?}", c.to_vec()),
                TypedColumn::Float(c) => format!("{:?}", c.to_vec()),
                TypedColumn::Str(c) => format!("{:?}", c.to_vec()),
                TypedColumn::IntList(c) => format!("{:?}", c.to_vec()),
                TypedColumn::FloatList(c) => format!("{:?}", c.to_vec()),
                TypedColumn::StrList(c) => format!("{:?}", c.to_vec()),
            };
            out.push((format!("{}.{name}", table.name()), values));
        }
    }
    out
}

proptest! {
    #[test]
    fn to_vec_matches_value(
        values in prop::collection::vec(-1_000_000i32..=1_000_000, 1..40),
        styles in prop::collection::vec(any::<u8>(), 1..8)
    ) {
        let text = int_loop(&values, &styles);
        let doc = cif::parse(&text).expect("parse loop");
        let column = doc.blocks[0].field("_t.v").expect("field").column::<i32>();
        let all = column.to_vec();
        prop_assert_eq!(all.len(), column.row_count());
        for (row, value) in all.iter().enumerate() {
            prop_assert_eq!(*value, column.value(row));
        }
        prop_assert_eq!(all, values);
    }

    #[test]
    fn equality_ignores_quoting(
        values in prop::collection::vec(0i32..5, 2..20),
        styles in prop::collection::vec(any::<u8>(), 1..8)
    ) {
        let text = int_loop(&values, &styles);
        let doc = cif::parse(&text).expect("parse loop");
        let column = doc.blocks[0].field("_t.v").expect("field").column::<i32>();
        for a in 0..values.len() {
            for b in 0..values.len() {
                prop_assert_eq!(
                    column.are_values_equal(a, b),
                    column.value(a) == column.value(b)
                );
            }
        }
    }

    #[test]
    fn repeated_reads_agree(
        mantissa in -99_999i64..=99_999,
        uncertainty in prop::option::of(1u8..99)
    ) {
        let number = format!("{:.3}", mantissa as f64 / 1000.0);
        let literal = match uncertainty {
            Some(u) => format!("{number}({u})"),
            None => number,
        };
        let text = format!("data_p\n_cell.length_a {literal}\n");
        let doc = cif::parse(&text).expect("parse pair");
        let column = doc.blocks[0].field("_cell.length_a").expect("field").column::<f64>();
        let first = column.value(0);
        prop_assert_eq!(first, column.value(0));
        prop_assert!(column.validate().is_ok());
    }

    #[test]
    fn decoding_twice_gives_equal_databases(
        rows in prop::collection::vec(
            (
                any::<i32>(),
                prop::option::of(-999_999i64..=999_999),
                "[A-Za-z][A-Za-z0-9 ]{0,8}",
                prop::collection::vec(0u8..100, 0..5),
            ),
            0..20
        )
    ) {
        let text = row_loop(&rows);
        let schema = row_schema();

        let first_doc = cif::parse(&text).expect("first parse");
        let first = map_schema(&schema, &first_doc.blocks[0]).expect("first mapping");
        let second_doc = cif::parse(&text).expect("second parse");
        let second = map_schema(&schema, &second_doc.blocks[0]).expect("second mapping");

        let first = snapshot(&first);
        prop_assert_eq!(first.len(), 6);
        prop_assert_eq!(first, snapshot(&second));
    }

    #[test]
    fn decoding_gro_twice_gives_equal_columns(
        coords in prop::collection::vec(
            (-99_999i32..=999_999, -99_999i32..=999_999, -99_999i32..=999_999),
            0..30
        )
    ) {
        let text = gro_text(&coords);
        let first = gro::parse(&text).expect("first parse");
        let second = gro::parse(&text).expect("second parse");
        prop_assert_eq!(first.structures.len(), second.structures.len());

        for (a, b) in first.structures.iter().zip(&second.structures) {
            prop_assert_eq!(&a.header, &b.header);
            let a = a.atoms().expect("atoms");
            let b = b.atoms().expect("atoms");
            prop_assert_eq!(a.residue_number.to_vec(), b.residue_number.to_vec());
            prop_assert_eq!(a.residue_name.to_vec(), b.residue_name.to_vec());
            prop_assert_eq!(a.atom_name.to_vec(), b.atom_name.to_vec());
            prop_assert_eq!(a.atom_number.to_vec(), b.atom_number.to_vec());
            for (ca, cb) in [(a.x, b.x), (a.y, b.y), (a.z, b.z), (a.vx, b.vx), (a.vy, b.vy), (a.vz, b.vz)] {
                prop_assert_eq!(ca.to_vec(), cb.to_vec());
            }
        }
    }

    #[test]
    fn gro_positions_decode(
        coords in prop::collection::vec(
            (-99_999i32..=999_999, -99_999i32..=999_999, -99_999i32..=999_999),
            1..30
        )
    ) {
        let text = gro_text(&coords);
        let file = gro::parse(&text).expect("parse gro");
        let structure = &file.structures[0];
        prop_assert!(!structure.header.has_velocities);
        let atoms = structure.atoms().expect("atoms");
        prop_assert_eq!(atoms.count, coords.len());
        for (row, (x, y, z)) in coords.iter().enumerate() {
            prop_assert!((atoms.x.value(row) - f64::from(*x) / 1000.0).abs() < 1e-9);
            prop_assert!((atoms.y.value(row) - f64::from(*y) / 1000.0).abs() < 1e-9);
            prop_assert!((atoms.z.value(row) - f64::from(*z) / 1000.0).abs() < 1e-9);
            prop_assert_eq!(atoms.atom_number.value(row), row as i32 + 1);
            prop_assert_eq!(atoms.vx.value_kind(row), ValueKind::Unspecified);
        }
    }

    #[test]
    fn absent_fields_fill_with_category_row_count(
        values in prop::collection::vec(-100i32..100, 0..25)
    ) {
        let text = int_loop(&values, &[0]);
        let doc = cif::parse(&text).expect("parse loop");
        let schema = Schema::new()
            .category("t", |c| c.int("v").float("missing"))
            .category("absent", |c| c.str("name"));
        let db = map_schema(&schema, &doc.blocks[0]).expect("map schema");

        let table = db.table("t").expect("table");
        prop_assert_eq!(table.row_count(), values.len());
        let missing = table.float("missing").expect("declared column");
        prop_assert!(!missing.is_defined());
        prop_assert_eq!(missing.row_count(), values.len());
        for row in 0..values.len() {
            prop_assert_eq!(missing.value_kind(row), ValueKind::Unspecified);
            prop_assert_eq!(missing.value(row), 0.0);
        }

        let absent = db.table("absent").expect("table");
        prop_assert!(!absent.is_present());
        prop_assert_eq!(absent.str("name").expect("declared column").row_count(), 0);
    }
}
