//! Shared fixtures for integration tests
//!
//! Writes small but valid GeoPackage files: the `gpkg_contents` and
//! `gpkg_geometry_columns` metadata tables plus one feature table whose
//! geometries are GeoPackage binary blobs (header + little-endian WKB).

#![allow(dead_code)]

use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use rusqlite::{params_from_iter, types::Value, Connection};

const WKB_POINT: u32 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

pub type Ring = Vec<(f64, f64)>;

/// One row of the fixture layer.
pub struct FixtureRow {
    pub geometry: Option<Vec<u8>>,
    pub attributes: Vec<Value>,
}

impl FixtureRow {
    pub fn new(geometry: Option<Vec<u8>>, attributes: Vec<Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}

// == WKB ==

pub fn point_wkb(x: f64, y: f64) -> Vec<u8> {
    let mut buf = wkb_header(WKB_POINT);
    buf.write_f64::<LittleEndian>(x).unwrap();
    buf.write_f64::<LittleEndian>(y).unwrap();
    buf
}

pub fn polygon_wkb(rings: &[Ring]) -> Vec<u8> {
    let mut buf = wkb_header(WKB_POLYGON);
    write_rings(&mut buf, rings);
    buf
}

pub fn multipolygon_wkb(polygons: &[Vec<Ring>]) -> Vec<u8> {
    let mut buf = wkb_header(WKB_MULTIPOLYGON);
    buf.write_u32::<LittleEndian>(polygons.len() as u32).unwrap();
    for rings in polygons {
        buf.extend(polygon_wkb(rings));
    }
    buf
}

/// Wraps WKB in a GeoPackage header: no envelope, little-endian, SRS 4326.
pub fn gpkg_blob(wkb: Vec<u8>) -> Vec<u8> {
    let mut buf = b"GP".to_vec();
    buf.push(0);
    buf.push(0b0000_0001);
    buf.write_i32::<LittleEndian>(4326).unwrap();
    buf.extend(wkb);
    buf
}

/// Closed axis-aligned square with its lower-left corner at (x, y).
pub fn square(x: f64, y: f64, size: f64) -> Ring {
    vec![
        (x, y),
        (x + size, y),
        (x + size, y + size),
        (x, y + size),
        (x, y),
    ]
}

fn wkb_header(geometry_type: u32) -> Vec<u8> {
    let mut buf = vec![1u8];
    buf.write_u32::<LittleEndian>(geometry_type).unwrap();
    buf
}

fn write_rings(buf: &mut Vec<u8>, rings: &[Ring]) {
    buf.write_u32::<LittleEndian>(rings.len() as u32).unwrap();
    for ring in rings {
        buf.write_u32::<LittleEndian>(ring.len() as u32).unwrap();
        for &(x, y) in ring {
            buf.write_f64::<LittleEndian>(x).unwrap();
            buf.write_f64::<LittleEndian>(y).unwrap();
        }
    }
}

// == GeoPackage ==

/// Writes a GeoPackage with a single feature layer named `table`.
///
/// `attributes` are `(name, declared type)` pairs; every row must carry one
/// value per attribute in the same order.
pub fn write_geopackage(
    path: &Path,
    table: &str,
    attributes: &[(&str, &str)],
    rows: &[FixtureRow],
) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE gpkg_contents (
             table_name TEXT NOT NULL PRIMARY KEY,
             data_type TEXT NOT NULL,
             identifier TEXT
         );
         CREATE TABLE gpkg_geometry_columns (
             table_name TEXT NOT NULL,
             column_name TEXT NOT NULL,
             geometry_type_name TEXT NOT NULL,
             srs_id INTEGER NOT NULL,
             z TINYINT NOT NULL,
             m TINYINT NOT NULL
         );",
    )
    .unwrap();

    conn.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier) VALUES (?1, 'features', ?1)",
        [table],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', 'GEOMETRY', 4326, 0, 0)",
        [table],
    )
    .unwrap();

    let mut columns = vec![
        "\"fid\" INTEGER PRIMARY KEY".to_string(),
        "\"geom\" GEOMETRY".to_string(),
    ];
    columns.extend(
        attributes
            .iter()
            .map(|(name, decl)| format!("\"{name}\" {decl}")),
    );
    conn.execute_batch(&format!(
        "CREATE TABLE \"{table}\" ({});",
        columns.join(", ")
    ))
    .unwrap();

    let names: Vec<String> = std::iter::once("\"geom\"".to_string())
        .chain(attributes.iter().map(|(name, _)| format!("\"{name}\"")))
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let insert = format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );

    for row in rows {
        assert_eq!(row.attributes.len(), attributes.len());
        let geometry = row
            .geometry
            .clone()
            .map_or(Value::Null, Value::Blob);
        let values = std::iter::once(geometry).chain(row.attributes.iter().cloned());
        conn.execute(&insert, params_from_iter(values)).unwrap();
    }
}

/// Departments layer: one square polygon per department.
pub fn write_departments(path: &Path, departments: &[(&str, &str)]) {
    let rows: Vec<FixtureRow> = departments
        .iter()
        .enumerate()
        .map(|(i, (code, name))| {
            FixtureRow::new(
                Some(gpkg_blob(polygon_wkb(&[square(i as f64, 0.0, 1.0)]))),
                vec![
                    Value::Text(code.to_string()),
                    Value::Text(name.to_string()),
                ],
            )
        })
        .collect();
    write_geopackage(
        path,
        "departamentos",
        &[("DPTO_CCDGO", "TEXT"), ("DPTO_CNMBR", "TEXT")],
        &rows,
    );
}

/// Municipality layer for one department with `count` multipolygons.
pub fn write_municipalities(path: &Path, department: &str, count: usize) {
    let rows: Vec<FixtureRow> = (0..count)
        .map(|i| {
            let offset = i as f64 * 2.0;
            FixtureRow::new(
                Some(gpkg_blob(multipolygon_wkb(&[
                    vec![square(offset, 0.0, 1.0)],
                    vec![square(offset, 1.5, 0.5)],
                ]))),
                vec![
                    Value::Text(department.to_string()),
                    Value::Text(format!("{department}{:03}", i + 1)),
                    Value::Real(10.5 * (i + 1) as f64),
                ],
            )
        })
        .collect();
    write_geopackage(
        path,
        "municipios",
        &[
            ("DPTO_CCDGO", "TEXT"),
            ("MPIO_CCDGO", "TEXT"),
            ("AREA_KM2", "REAL"),
        ],
        &rows,
    );
}

/// Bytes of a municipality GeoPackage, as served by object storage.
pub fn municipality_bytes(department: &str, count: usize) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.gpkg");
    write_municipalities(&path, department, count);
    std::fs::read(&path).unwrap()
}
