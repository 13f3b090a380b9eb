//! The portable relational type taxonomy and the refinement rules shared by
//! both dialect tables.
//!
//! Lookups here are deliberately infallible: metadata is best effort, so an
//! unknown native type falls back to a variable-length character type
//! instead of erroring. Statement execution correctness never depends on
//! these mappings.

/// Portable classification of a native engine type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortableType {
    Bit,
    Boolean,
    Char,
    VarChar,
    LongVarChar,
    Binary,
    VarBinary,
    LongVarBinary,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Numeric,
    Date,
    Time,
    Timestamp,
    Array,
    Null,
    Other,
}

impl PortableType {
    /// Is this a numeric classification?
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PortableType::TinyInt
                | PortableType::SmallInt
                | PortableType::Integer
                | PortableType::BigInt
                | PortableType::Float
                | PortableType::Double
                | PortableType::Decimal
                | PortableType::Numeric
        )
    }

    /// Is this a date/time classification?
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            PortableType::Date | PortableType::Time | PortableType::Timestamp
        )
    }

    /// Is this a character classification (whose byte length scales with
    /// the collation's bytes-per-character)?
    pub fn is_character(self) -> bool {
        matches!(
            self,
            PortableType::Char | PortableType::VarChar | PortableType::LongVarChar
        )
    }
}

/// The fallback for anything a dialect table does not recognize.
pub const DEFAULT_PORTABLE: PortableType = PortableType::VarChar;
pub const DEFAULT_PORTABLE_NAME: &str = "VARCHAR";

/// One row of a dialect's native type table.
#[derive(Debug, Clone, Copy)]
pub struct TypeRow {
    pub id: u32,
    pub name: &'static str,
    pub portable: PortableType,
    pub portable_name: &'static str,
}

/// A declared type string pulled apart into its components.
///
/// Column descriptions arrive as strings like `decimal(10,2) unsigned`; the
/// annotation must be split off before the name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub base_name: String,
    pub precision: u32,
    pub scale: u32,
    pub unsigned: bool,
}

/// Split a declared type into base name, precision/scale and signedness.
///
/// Unparseable numbers inside the parentheses quietly become zero.
pub fn split_annotation(declared: &str) -> TypeAnnotation {
    let trimmed = declared.trim();
    let (body, unsigned) = match trimmed
        .to_ascii_lowercase()
        .strip_suffix("unsigned")
        .map(str::len)
    {
        Some(len) => (trimmed[..len].trim_end(), true),
        None => (trimmed, false),
    };

    let mut precision = 0;
    let mut scale = 0;
    let base_name = match (body.find('('), body.find(')')) {
        (Some(open), Some(close)) if close > open => {
            let inner = &body[open + 1..close];
            match inner.split_once(',') {
                Some((p, s)) => {
                    precision = p.trim().parse().unwrap_or(0);
                    scale = s.trim().parse().unwrap_or(0);
                }
                None => precision = inner.trim().parse().unwrap_or(0),
            }
            body[..open].trim()
        }
        _ => body,
    };

    TypeAnnotation {
        base_name: base_name.to_owned(),
        precision,
        scale,
        unsigned,
    }
}

/// A fully resolved native type, ready to be placed on a field descriptor.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub native_name: String,
    pub native_id: u32,
    pub portable: PortableType,
    pub portable_name: &'static str,
    pub precision: u32,
    pub scale: u32,
    pub unsigned: bool,
    /// Added to the declared precision to obtain the reported precision.
    pub precision_adjust: i32,
}

/// Apply the shared post-lookup adjustments and assemble a [`ResolvedType`].
pub(crate) fn refine(row: &TypeRow, ann: TypeAnnotation) -> ResolvedType {
    let mut portable = row.portable;
    let mut portable_name = row.portable_name;

    // a single-bit integer is a logical type in disguise
    if portable == PortableType::TinyInt && ann.precision == 1 {
        portable = PortableType::Bit;
        portable_name = "BIT";
    }

    // keep binary classifications from leaking through for text-like
    // columns; the display name stays as declared
    if !row.portable.is_numeric() && !row.portable.is_temporal() {
        if portable == PortableType::LongVarBinary {
            portable = PortableType::LongVarChar;
        } else if portable == PortableType::VarBinary {
            portable = PortableType::VarChar;
        }
    }

    ResolvedType {
        native_name: ann.base_name,
        native_id: row.id,
        portable,
        portable_name,
        precision: ann.precision,
        scale: ann.scale,
        unsigned: ann.unsigned,
        precision_adjust: precision_adjust(row.portable, ann.unsigned),
    }
}

/// The historical precision quirk: signed fixed-point decimals under-report
/// by one, floating-point types over-report by one. Preserved as protocol
/// behavior, not corrected.
pub fn precision_adjust(portable: PortableType, unsigned: bool) -> i32 {
    match portable {
        PortableType::Decimal | PortableType::Numeric if !unsigned => -1,
        PortableType::Float | PortableType::Double => 1,
        _ => 0,
    }
}

/// Case-insensitive row lookup shared by the dialect tables.
pub(crate) fn row_by_name<'a>(rows: &'a [TypeRow], name: &str) -> Option<&'a TypeRow> {
    rows.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

pub(crate) fn row_by_id(rows: &'static [TypeRow], id: u32) -> Option<&'static TypeRow> {
    rows.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_splitting() {
        let ann = split_annotation("decimal(10,2)");
        assert_eq!(ann.base_name, "decimal");
        assert_eq!((ann.precision, ann.scale), (10, 2));
        assert!(!ann.unsigned);

        let ann = split_annotation("int(11) unsigned");
        assert_eq!(ann.base_name, "int");
        assert_eq!(ann.precision, 11);
        assert!(ann.unsigned);

        let ann = split_annotation("text");
        assert_eq!(ann.base_name, "text");
        assert_eq!((ann.precision, ann.scale), (0, 0));
    }

    #[test]
    fn unparseable_numbers_become_zero() {
        let ann = split_annotation("enum('a','b')");
        assert_eq!(ann.base_name, "enum");
        assert_eq!(ann.precision, 0);
    }

    #[test]
    fn adjust_factor_rules() {
        assert_eq!(precision_adjust(PortableType::Decimal, false), -1);
        assert_eq!(precision_adjust(PortableType::Decimal, true), 0);
        assert_eq!(precision_adjust(PortableType::Float, false), 1);
        assert_eq!(precision_adjust(PortableType::Double, true), 1);
        assert_eq!(precision_adjust(PortableType::VarChar, false), 0);
    }

    #[test]
    fn single_bit_integer_reports_logical() {
        let row = TypeRow {
            id: 1,
            name: "TINYINT",
            portable: PortableType::TinyInt,
            portable_name: "TINYINT",
        };
        let resolved = refine(&row, split_annotation("tinyint(1)"));
        assert_eq!(resolved.portable, PortableType::Bit);

        let resolved = refine(&row, split_annotation("tinyint(4)"));
        assert_eq!(resolved.portable, PortableType::TinyInt);
    }
}
