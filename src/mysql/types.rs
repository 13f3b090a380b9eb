//! MySQL native type table.
//!
//! Ids follow the wire protocol field types. `TYPES` is the canonical set:
//! unique ids and unique names, so id and name round-trip through each
//! other. `ALIASES` carries the secondary spellings column descriptions use
//! (`bool`, `text`, `mediumint`, ...) for name lookups only.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::{
    refine, row_by_id, split_annotation, PortableType as P, ResolvedType, TypeRow,
    DEFAULT_PORTABLE, DEFAULT_PORTABLE_NAME,
};

#[rustfmt::skip]
pub const TYPES: &[TypeRow] = &[
    TypeRow { id: 0,   name: "DECIMAL",     portable: P::Decimal,     portable_name: "DECIMAL" },
    TypeRow { id: 1,   name: "CHAR",        portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 2,   name: "SHORT",       portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 3,   name: "LONG",        portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 4,   name: "FLOAT",       portable: P::Double,      portable_name: "DOUBLE" },
    TypeRow { id: 5,   name: "DOUBLE",      portable: P::Double,      portable_name: "DOUBLE" },
    TypeRow { id: 6,   name: "NULL",        portable: P::Null,        portable_name: "NULL" },
    TypeRow { id: 7,   name: "TIMESTAMP",   portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 8,   name: "LONGLONG",    portable: P::BigInt,      portable_name: "BIGINT" },
    TypeRow { id: 9,   name: "INT",         portable: P::Integer,     portable_name: "INTEGER" },
    TypeRow { id: 10,  name: "DATE",        portable: P::Date,        portable_name: "DATE" },
    TypeRow { id: 11,  name: "TIME",        portable: P::Time,        portable_name: "TIME" },
    TypeRow { id: 12,  name: "DATETIME",    portable: P::Timestamp,   portable_name: "TIMESTAMP" },
    TypeRow { id: 13,  name: "YEAR",        portable: P::Date,        portable_name: "DATE" },
    TypeRow { id: 14,  name: "NEWDATE",     portable: P::Date,        portable_name: "DATE" },
    // BIT reports as CHAR portably but keeps its own display name
    TypeRow { id: 16,  name: "BIT",         portable: P::Char,        portable_name: "BIT" },
    TypeRow { id: 246, name: "NEWDECIMAL",  portable: P::Decimal,     portable_name: "DECIMAL" },
    TypeRow { id: 247, name: "ENUM",        portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 248, name: "SET",         portable: P::Char,        portable_name: "CHAR" },
    TypeRow { id: 249, name: "TINYBLOB",    portable: P::LongVarBinary, portable_name: "LONGVARBINARY" },
    TypeRow { id: 250, name: "MEDIUMBLOB",  portable: P::LongVarBinary, portable_name: "LONGVARBINARY" },
    TypeRow { id: 251, name: "LONGBLOB",    portable: P::LongVarBinary, portable_name: "LONGVARBINARY" },
    TypeRow { id: 252, name: "BLOB",        portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 253, name: "LONGVARCHAR", portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 254, name: "VARCHAR",     portable: P::VarChar,     portable_name: "VARCHAR" },
    TypeRow { id: 255, name: "GEOMETRY",    portable: P::Binary,      portable_name: "BINARY" },
];

/// Secondary spellings, resolved by name only.
#[rustfmt::skip]
pub const ALIASES: &[TypeRow] = &[
    TypeRow { id: 1,   name: "TINY",       portable: P::Integer,   portable_name: "TINYINT" },
    TypeRow { id: 1,   name: "TINYINT",    portable: P::TinyInt,   portable_name: "TINYINT" },
    TypeRow { id: 1,   name: "BOOL",       portable: P::TinyInt,   portable_name: "TINYINT" },
    TypeRow { id: 1,   name: "BOOLEAN",    portable: P::TinyInt,   portable_name: "TINYINT" },
    TypeRow { id: 2,   name: "SMALLINT",   portable: P::SmallInt,  portable_name: "SMALLINT" },
    TypeRow { id: 9,   name: "MEDIUMINT",  portable: P::Integer,   portable_name: "MEDIUMINT" },
    TypeRow { id: 3,   name: "INTEGER",    portable: P::Integer,   portable_name: "INTEGER" },
    TypeRow { id: 8,   name: "BIGINT",     portable: P::BigInt,    portable_name: "BIGINT" },
    TypeRow { id: 8,   name: "SERIAL",     portable: P::BigInt,    portable_name: "BIGINT" },
    TypeRow { id: 5,   name: "REAL",       portable: P::Double,    portable_name: "DOUBLE" },
    TypeRow { id: 246, name: "NUMERIC",    portable: P::Numeric,   portable_name: "NUMERIC" },
    TypeRow { id: 253, name: "TINYTEXT",   portable: P::VarChar,   portable_name: "VARCHAR" },
    TypeRow { id: 252, name: "TEXT",       portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 251, name: "MEDIUMTEXT", portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 251, name: "LONGTEXT",   portable: P::LongVarChar, portable_name: "LONGVARCHAR" },
    TypeRow { id: 255, name: "BINARY",     portable: P::Binary,    portable_name: "BINARY" },
    TypeRow { id: 253, name: "VARBINARY",  portable: P::VarBinary, portable_name: "VARBINARY" },
];

static BY_NAME: Lazy<HashMap<String, &'static TypeRow>> = Lazy::new(|| {
    let mut index = HashMap::new();
    // canonical rows win over aliases on a spelling clash
    for row in ALIASES.iter().chain(TYPES) {
        index.insert(row.name.to_ascii_uppercase(), row);
    }
    index
});

fn lookup_name(name: &str) -> Option<&'static TypeRow> {
    BY_NAME.get(&name.to_ascii_uppercase()).copied()
}

/// Native type name for a wire type id; unknown ids read as VARCHAR.
pub fn id_to_name(id: u32) -> &'static str {
    row_by_id(TYPES, id).map_or("VARCHAR", |r| r.name)
}

/// Wire type id for a native name; unknown names read as VARCHAR's id.
pub fn name_to_id(name: &str) -> u32 {
    lookup_name(name).map_or(254, |r| r.id)
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

/// Full resolution of a declared column type as reported by the server,
/// annotation and all (`int(11) unsigned`, `decimal(10,2)`, `tinyint(1)`).
pub fn resolve(declared: &str) -> ResolvedType {
    let ann = split_annotation(declared);
    match lookup_name(&ann.base_name) {
        Some(row) => refine(row, ann),
        None => {
            let fallback = TypeRow {
                id: 254,
                name: "VARCHAR",
                portable: DEFAULT_PORTABLE,
                portable_name: DEFAULT_PORTABLE_NAME,
            };
            refine(&fallback, ann)
        }
    }
}
