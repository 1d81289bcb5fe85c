//! GeoPackage dataset reading
//!
//! [`DatasetReader`] is the seam between the cache and the on-disk vector
//! format. [`GeoPackageReader`] implements it on top of SQLite: the first
//! `features` layer listed in `gpkg_contents` is read in row order.

use std::path::Path;

use rusqlite::{types::ValueRef, Connection, OpenFlags};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::model::{Feature, FeatureCollection, Properties};
use super::wkb::decode_gpkg_geometry;
use crate::error::{BoundaryError, Result};

// == Dataset Reader ==
/// Produces a feature collection from the first layer of a dataset file.
///
/// Implementations are blocking and must release every handle they open
/// before returning, on success and on failure.
pub trait DatasetReader: Send + Sync {
    fn read_first_layer(&self, path: &Path) -> Result<FeatureCollection>;
}

/// Reads GeoPackage (`.gpkg`) files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoPackageReader;

impl DatasetReader for GeoPackageReader {
    fn read_first_layer(&self, path: &Path) -> Result<FeatureCollection> {
        if !path.is_file() {
            return Err(BoundaryError::dataset_open(path, "file does not exist"));
        }

        // The connection is closed when it goes out of scope.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| BoundaryError::dataset_open(path, e))?;

        let layer = LayerSchema::load_first(&conn).map_err(|e| BoundaryError::dataset_open(path, e))?;
        debug!(path = %path.display(), layer = %layer.table, "reading first layer");

        layer.read_features(&conn)
    }
}

#[derive(Debug)]
struct Column {
    name: String,
    is_boolean: bool,
}

/// Table layout of a feature layer.
#[derive(Debug)]
struct LayerSchema {
    table: String,
    geometry_column: String,
    /// Integer primary key, exposed as the feature id
    fid_column: Option<String>,
    attributes: Vec<Column>,
}

impl LayerSchema {
    fn load_first(conn: &Connection) -> rusqlite::Result<Self> {
        let table: String = conn.query_row(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY rowid LIMIT 1",
            [],
            |row| row.get(0),
        )?;

        let geometry_column: String = conn.query_row(
            "SELECT column_name FROM gpkg_geometry_columns WHERE table_name = ?1",
            [&table],
            |row| row.get(0),
        )?;

        let mut fid_column = None;
        let mut attributes = Vec::new();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            let decl_type: String = row.get::<_, Option<String>>(2)?.unwrap_or_default();
            let pk: i64 = row.get(5)?;

            if name == geometry_column {
                continue;
            }
            if pk == 1 && decl_type.eq_ignore_ascii_case("INTEGER") && fid_column.is_none() {
                fid_column = Some(name);
                continue;
            }
            attributes.push(Column {
                is_boolean: decl_type.eq_ignore_ascii_case("BOOLEAN"),
                name,
            });
        }

        Ok(Self {
            table,
            geometry_column,
            fid_column,
            attributes,
        })
    }

    fn select_sql(&self) -> String {
        let mut columns = vec![quote_ident(&self.geometry_column)];
        columns.push(
            self.fid_column
                .as_deref()
                .map(quote_ident)
                .unwrap_or_else(|| "NULL".to_string()),
        );
        columns.extend(self.attributes.iter().map(|c| quote_ident(&c.name)));
        format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            quote_ident(&self.table)
        )
    }

    /// Reads every row; any failure discards the partial result.
    fn read_features(&self, conn: &Connection) -> Result<FeatureCollection> {
        let layer_err = |e: rusqlite::Error| BoundaryError::LayerRead(format!("{}: {e}", self.table));

        let mut stmt = conn.prepare(&self.select_sql()).map_err(layer_err)?;
        let mut rows = stmt.query([]).map_err(layer_err)?;

        let mut features = Vec::new();
        while let Some(row) = rows.next().map_err(layer_err)? {
            let geometry = match row.get_ref(0).map_err(layer_err)? {
                ValueRef::Null => None,
                ValueRef::Blob(blob) => Some(decode_gpkg_geometry(blob).map_err(|e| {
                    BoundaryError::LayerRead(format!(
                        "{}: feature {}: {e}",
                        self.table,
                        features.len()
                    ))
                })?),
                other => {
                    return Err(BoundaryError::LayerRead(format!(
                        "{}: geometry column holds {:?} instead of a blob",
                        self.table,
                        other.data_type()
                    )))
                }
            };

            let id: Option<i64> = row.get(1).map_err(layer_err)?;

            let mut properties = Properties::new();
            for (index, column) in self.attributes.iter().enumerate() {
                let value = row.get_ref(index + 2).map_err(layer_err)?;
                properties.insert(column.name.clone(), to_json(value, column));
            }

            features.push(Feature {
                id,
                properties,
                geometry,
            });
        }

        Ok(FeatureCollection::new(features))
    }
}

fn to_json(value: ValueRef<'_>, column: &Column) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if column.is_boolean => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            warn!(column = %column.name, "binary attribute exported as null");
            Value::Null
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
