//! `.gro` record driver.

use std::sync::Arc;

use glam::Vec3;
use log::{debug, warn};

use super::{GroFile, GroHeader, GroPrecision, GroStructure, ATOMS};
use crate::dom::{Block, Category, Field, FieldKind};
use crate::error::DecodeError;
use crate::options::DecodeOptions;
use crate::text::number::{parse_float, parse_int};
use crate::text::tokenizer::{Tokenizer, Tokens};

/// Width of the residue number, residue name, atom name and atom number
/// columns together.
const POSITION_OFFSET: usize = 20;

/// Parse every record in `input` with default options.
pub fn parse(input: &str) -> Result<GroFile<'_>, DecodeError> {
    parse_with(input, &DecodeOptions::default())
}

/// Parse every record in `input`.
///
/// An empty or all-whitespace input yields a file with no structures.
pub fn parse_with<'a>(input: &'a str, options: &DecodeOptions) -> Result<GroFile<'a>, DecodeError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut structures = Vec::new();

    while !rest_is_blank(input, tokenizer.position()) {
        let structure = parse_record(&mut tokenizer, options)?;
        debug!(
            "gro record {:?}: {} atoms, velocities: {}",
            structure.header.title,
            structure.atom_count(),
            structure.header.has_velocities
        );
        structures.push(structure);
    }

    Ok(GroFile { structures })
}

/// Upper bound on the lines left after the cursor.
fn remaining_lines(tokenizer: &Tokenizer<'_>) -> usize {
    let rest = tokenizer.data().as_bytes().get(tokenizer.position()..).unwrap_or_default();
    rest.iter().filter(|&&b| b == b'\n').count() + 1
}

fn rest_is_blank(input: &str, position: usize) -> bool {
    input.get(position..).is_none_or(|rest| rest.trim().is_empty())
}

fn parse_record<'a>(
    tokenizer: &mut Tokenizer<'a>,
    options: &DecodeOptions,
) -> Result<GroStructure<'a>, DecodeError> {
    let (title, time_in_ps) = read_title(tokenizer);
    let atom_count = read_atom_count(tokenizer)?;

    let first_line = tokenizer.line_number();
    let mut lines = Tokens::with_capacity(atom_count.min(remaining_lines(tokenizer)));
    for found in 0..atom_count {
        if tokenizer.is_eof() {
            return Err(DecodeError::TruncatedData {
                context: "gro atoms".into(),
                expected: atom_count,
                found,
            });
        }
        tokenizer.mark_line();
        tokenizer.push_token(&mut lines);
    }

    let data = tokenizer.data();
    let (precision, has_velocities) = if lines.is_empty() {
        (GroPrecision::default(), false)
    } else {
        infer_precision(lines.slice(data, 0)).ok_or_else(|| DecodeError::MalformedHeader {
            line: first_line,
            detail: "cannot infer coordinate precision from first atom line".into(),
        })?
    };

    let position_width = precision.position + 5;
    let velocity_width = precision.velocity + 4;
    let mut required = POSITION_OFFSET + 3 * position_width;
    if has_velocities {
        required += 3 * velocity_width;
    }
    check_line_lengths(&lines, required, first_line, options)?;

    let box_size = read_box(tokenizer)?;

    let lines = Arc::new(lines);
    let column = |name: &str, kind: FieldKind, offset: usize, width: usize| {
        Field::fixed(name, kind, data, Arc::clone(&lines), offset, width)
    };
    let mut fields = vec![
        column("residue_number", FieldKind::Int, 0, 5),
        column("residue_name", FieldKind::Str, 5, 5),
        column("atom_name", FieldKind::Str, 10, 5),
        column("atom_number", FieldKind::Int, 15, 5),
    ];
    for (i, name) in ["x", "y", "z"].into_iter().enumerate() {
        let offset = POSITION_OFFSET + i * position_width;
        fields.push(column(name, FieldKind::Float, offset, position_width));
    }
    if has_velocities {
        let velocity_offset = POSITION_OFFSET + 3 * position_width;
        for (i, name) in ["vx", "vy", "vz"].into_iter().enumerate() {
            let offset = velocity_offset + i * velocity_width;
            fields.push(column(name, FieldKind::Float, offset, velocity_width));
        }
    }

    let mut block = Block::new(title.clone());
    block
        .categories
        .push(Category::new(ATOMS, atom_count, fields)?);

    Ok(GroStructure {
        header: GroHeader {
            title,
            time_in_ps,
            has_velocities,
            precision,
            box_size,
        },
        block,
    })
}

/// Title line, skipping one blank line before it. Text after the last `t=`
/// is the simulation time.
fn read_title(tokenizer: &mut Tokenizer<'_>) -> (String, Option<f64>) {
    tokenizer.mark_line();
    if tokenizer.token().trim().is_empty() {
        tokenizer.mark_line();
    }
    let line = tokenizer.token();

    let Some(at) = line.rfind("t=") else {
        return (line.trim().to_string(), None);
    };
    let time = line[at + 2..]
        .split_whitespace()
        .next()
        .filter(|t| t.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')))
        .map(|t| parse_float(t, 0, t.len()).value);
    let title = line[..at].trim();
    let title = title.strip_suffix(',').unwrap_or(title);
    (title.to_string(), time)
}

fn read_atom_count(tokenizer: &mut Tokenizer<'_>) -> Result<usize, DecodeError> {
    let line = tokenizer.line_number();
    let malformed = |detail: String| DecodeError::MalformedHeader { line, detail };
    if tokenizer.is_eof() {
        return Err(malformed("missing atom count".into()));
    }
    tokenizer.mark_line();
    let text = tokenizer.token();
    let count = parse_int(text, 0, text.len());
    if text.trim().is_empty() || !count.complete || count.value < 0 {
        return Err(malformed(format!("invalid atom count {:?}", text.trim())));
    }
    Ok(count.value as usize)
}

/// First three reals of the box line; any further triclinic terms are ignored.
fn read_box(tokenizer: &mut Tokenizer<'_>) -> Result<Vec3, DecodeError> {
    let line = tokenizer.line_number();
    let malformed = |detail: &str| DecodeError::MalformedHeader {
        line,
        detail: detail.to_string(),
    };
    if tokenizer.is_eof() {
        return Err(malformed("missing box vectors"));
    }
    tokenizer.mark_line();

    let mut values = [0.0f32; 3];
    let mut parts = tokenizer.token().split_whitespace();
    for value in &mut values {
        let part = parts.next().ok_or_else(|| malformed("expected three box lengths"))?;
        let scanned = parse_float(part, 0, part.len());
        if !scanned.complete {
            return Err(malformed("unparsable box length"));
        }
        *value = scanned.value as f32;
    }
    Ok(Vec3::from_array(values))
}

/// Decimal places of the position and velocity columns, inferred from the
/// text after the fixed atom columns of `line`.
///
/// Column widths are measured between successive decimal points: `p + 5` for
/// positions and `v + 4` for velocities. Returns `None` with fewer than three
/// decimal groups.
fn infer_precision(line: &str) -> Option<(GroPrecision, bool)> {
    let sample = line.as_bytes().get(POSITION_OFFSET..)?;

    // (index of '.', digits after it)
    let mut groups = Vec::new();
    for (i, &b) in sample.iter().enumerate() {
        if b != b'.' {
            continue;
        }
        let digits = sample[i + 1..]
            .iter()
            .take_while(|d| d.is_ascii_digit())
            .count();
        if digits > 0 {
            groups.push((i, digits));
        }
    }
    if groups.len() < 3 {
        return None;
    }

    let has_velocities = groups.len() >= 6;
    let position = (groups[1].0 - groups[0].0)
        .checked_sub(5)
        .filter(|&p| p > 0)
        .unwrap_or(groups[0].1);
    let velocity = if has_velocities {
        (groups[4].0 - groups[3].0)
            .checked_sub(4)
            .filter(|&v| v > 0)
            .unwrap_or(groups[3].1)
    } else {
        0
    };
    Some((GroPrecision { position, velocity }, has_velocities))
}

fn check_line_lengths(
    lines: &Tokens,
    required: usize,
    first_line: usize,
    options: &DecodeOptions,
) -> Result<(), DecodeError> {
    let mut short = 0;
    for (i, (start, end)) in lines.iter().enumerate() {
        let found = end - start;
        if found >= required {
            continue;
        }
        if options.is_strict() {
            return Err(DecodeError::TruncatedLine {
                line: first_line + i,
                expected: required,
                found,
            });
        }
        short += 1;
    }
    if short > 0 {
        warn!("{short} gro atom line(s) shorter than {required} bytes; missing columns read as zero");
    }
    Ok(())
}
