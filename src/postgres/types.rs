//! PostgreSQL native type table.
//!
//! Ids are pg_type OIDs. Array element types all classify as `Array`; the
//! DATE and TIMETZ rows deliberately report TIMESTAMP portably, matching
//! the protocol's historical behavior.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::{
    refine, row_by_id, split_annotation, PortableType as P, ResolvedType, TypeRow,
    DEFAULT_PORTABLE, DEFAULT_PORTABLE_NAME,
};

#[rustfmt::skip]
pub const TYPES: &[TypeRow] = &[
    TypeRow { id: 0,    name: "UNSPECIFIED",       portable: P::Other,       portable_name: "OTHER" },
    TypeRow { id: 16,   name: "BOOL",              portable: P::Boolean,     portable_name: "BOOLEAN" },
    TypeRow { id: 17,   name: "BYTEA",             portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 18,   name: "CHAR",              portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 19,   name: "NAME",              portable: P::VarChar,     portable_name: "VARCHAR" },
    TypeRow { id: 20,   name: "INT8",              portable: P::BigInt,      portable_name: "BIGINT" },
    TypeRow { id: 21,   name: "INT2",              portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 23,   name: "INT4",              portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 25,   name: "TEXT",              portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 26,   name: "OID",               portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 700,  name: "FLOAT4",            portable: P::Float,       portable_name: "FLOAT" },
    TypeRow { id: 701,  name: "FLOAT8",            portable: P::Double,      portable_name: "DOUBLE" },
    TypeRow { id: 790,  name: "MONEY",             portable: P::Double,      portable_name: "DOUBLE" },
    TypeRow { id: 1042, name: "BPCHAR",            portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 1043, name: "VARCHAR",           portable: P::VarChar,     portable_name: "VARCHAR" },
    // DATE reporting as TIMESTAMP is long-standing observable behavior
    TypeRow { id: 1082, name: "DATE",              portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 1083, name: "TIME",              portable: P::Time,        portable_name: "TIME" },
    TypeRow { id: 1114, name: "TIMESTAMP",         portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 1184, name: "TIMESTAMPTZ",       portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 1186, name: "INTERVAL",          portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 1266, name: "TIMETZ",            portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 1560, name: "BIT",               portable: P::Bit,         portable_name: "BIT" },
    TypeRow { id: 1562, name: "VARBIT",            portable: P::VarChar,     portable_name: "VARCHAR" },
    TypeRow { id: 1700, name: "NUMERIC",           portable: P::Numeric,     portable_name: "NUMERIC" },
    TypeRow { id: 2278, name: "VOID",              portable: P::Null,        portable_name: "NULL" },
    TypeRow { id: 1000, name: "BOOL_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1001, name: "BYTEA_ARRAY",       portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1002, name: "CHAR_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1003, name: "NAME_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1005, name: "INT2_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1007, name: "INT4_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1009, name: "TEXT_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1014, name: "BPCHAR_ARRAY",      portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1015, name: "VARCHAR_ARRAY",     portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1016, name: "INT8_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1021, name: "FLOAT4_ARRAY",      portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1022, name: "FLOAT8_ARRAY",      portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1028, name: "OID_ARRAY",         portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 791,  name: "MONEY_ARRAY",       portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1115, name: "TIMESTAMP_ARRAY",   portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1182, name: "DATE_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1183, name: "TIME_ARRAY",        portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1185, name: "TIMESTAMPTZ_ARRAY", portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1187, name: "INTERVAL_ARRAY",    portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1231, name: "NUMERIC_ARRAY",     portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1270, name: "TIMETZ_ARRAY",      portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1561, name: "BIT_ARRAY",         portable: P::Array,       portable_name: "ARRAY" },
    TypeRow { id: 1563, name: "VARBIT_ARRAY",      portable: P::Array,       portable_name: "ARRAY" },
];

/// Spellings seen in catalog output that differ from the canonical names.
#[rustfmt::skip]
pub const ALIASES: &[TypeRow] = &[
    TypeRow { id: 21,   name: "SMALLINT",          portable: P::Integer,   portable_name: "INTEGER" },
    TypeRow { id: 23,   name: "INTEGER",           portable: P::Integer,   portable_name: "INTEGER" },
    TypeRow { id: 23,   name: "INT",               portable: P::Integer,   portable_name: "INTEGER" },
    TypeRow { id: 23,   name: "SERIAL",            portable: P::Integer,   portable_name: "INTEGER" },
    TypeRow { id: 20,   name: "BIGINT",            portable: P::BigInt,    portable_name: "BIGINT" },
    TypeRow { id: 20,   name: "BIGSERIAL",         portable: P::BigInt,    portable_name: "BIGINT" },
    TypeRow { id: 700,  name: "REAL",              portable: P::Float,     portable_name: "FLOAT" },
    TypeRow { id: 701,  name: "DOUBLE PRECISION",  portable: P::Double,    portable_name: "DOUBLE" },
    TypeRow { id: 1700, name: "DECIMAL",           portable: P::Numeric,   portable_name: "NUMERIC" },
    TypeRow { id: 16,   name: "BOOLEAN",           portable: P::Boolean,   portable_name: "BOOLEAN" },
    TypeRow { id: 1042, name: "CHARACTER",         portable: P::Char,      portable_name: "CHAR" },
    TypeRow { id: 1043, name: "CHARACTER VARYING", portable: P::VarChar,   portable_name: "VARCHAR" },
];

static BY_NAME: Lazy<HashMap<String, &'static TypeRow>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for row in ALIASES.iter().chain(TYPES) {
        index.insert(row.name.to_ascii_uppercase(), row);
    }
    index
});

fn lookup_name(name: &str) -> Option<&'static TypeRow> {
    BY_NAME.get(&name.to_ascii_uppercase()).copied()
}

/// Native type name for an OID; unknown reads as VARCHAR.
pub fn id_to_name(id: u32) -> &'static str {
    row_by_id(TYPES, id).map_or("VARCHAR", |r| r.name)
}

/// OID for a native type name; unknown reads as VARCHAR's OID.
pub fn name_to_id(name: &str) -> u32 {
    lookup_name(name).map_or(1043, |r| r.id)
}

pub fn id_to_portable(id: u32) -> P {
    row_by_id(TYPES, id).map_or(DEFAULT_PORTABLE, |r| r.portable)
}

pub fn id_to_portable_name(id: u32) -> &'static str {
    row_by_id(TYPES, id).map_or(DEFAULT_PORTABLE_NAME, |r| r.portable_name)
}

pub fn name_to_portable(name: &str) -> P {
    lookup_name(name).map_or(DEFAULT_PORTABLE, |r| r.portable)
}

pub fn name_to_portable_name(name: &str) -> &'static str {
    lookup_name(name).map_or(DEFAULT_PORTABLE_NAME, |r| r.portable_name)
}

/// Full resolution of a declared column type (`numeric(10,2)`,
/// `character varying(64)`, `_int4` array spellings).
pub fn resolve(declared: &str) -> ResolvedType {
    let mut ann = split_annotation(declared);

    // catalog output writes array types with a leading underscore
    if let Some(element) = ann.base_name.strip_prefix('_') {
        ann.base_name = format!("{}_ARRAY", element.to_ascii_uppercase());
    }

    match lookup_name(&ann.base_name) {
        Some(row) => refine(row, ann),
        None => {
            let fallback = TypeRow {
                id: 1043,
                name: "VARCHAR",
                portable: DEFAULT_PORTABLE,
                portable_name: DEFAULT_PORTABLE_NAME,
            };
            refine(&fallback, ann)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_names_round_trip() {
        for row in TYPES {
            assert_eq!(name_to_id(id_to_name(row.id)), row.id, "oid {}", row.id);
        }
    }

    #[test]
    fn canonical_rows_are_unique() {
        for (i, a) in TYPES.iter().enumerate() {
            for b in &TYPES[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn date_reports_as_timestamp() {
        assert_eq!(name_to_portable("date"), P::Timestamp);
        assert_eq!(name_to_portable_name("date"), "TIMESTAMP");
    }

    #[test]
    fn arrays_classify_uniformly() {
        assert_eq!(id_to_portable(1007), P::Array);
        assert_eq!(name_to_portable("int2_array"), P::Array);
        assert_eq!(resolve("_int4").portable, P::Array);
    }

    #[test]
    fn unknown_falls_back_silently() {
        assert_eq!(name_to_portable("tsvector"), P::VarChar);
        assert_eq!(id_to_name(424242), "VARCHAR");
    }

    #[test]
    fn resolve_declared_types() {
        let t = resolve("numeric(12,4)");
        assert_eq!(t.portable, P::Numeric);
        assert_eq!((t.precision, t.scale), (12, 4));
        assert_eq!(t.precision_adjust, -1);

        let t = resolve("character varying(64)");
        assert_eq!(t.portable, P::VarChar);
        assert_eq!(t.precision, 64);

        let t = resolve("float4");
        assert_eq!(t.precision_adjust, 1);
    }
}
