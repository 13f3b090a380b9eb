//! Field descriptors: the finished product of a metadata fetch.

use bitflags::bitflags;

use crate::types::{PortableType, ResolvedType, DEFAULT_PORTABLE, DEFAULT_PORTABLE_NAME};

bitflags! {
    /// Key and storage properties of a column.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u8 {
        const NULLABLE = 1;
        const UNSIGNED = 2;
        const AUTO_INCREMENT = 4;
        const PRIMARY_KEY = 8;
        const UNIQUE_KEY = 16;
        const INDEXED = 32;
    }
}

/// Direction of a statement parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    #[default]
    In,
    Out,
    InOut,
}

/// Whether a descriptor describes a result column or a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Result,
    Parameter,
}

/// One fully described result column or parameter.
///
/// Built once by a dialect strategy and read-only afterwards; everything the
/// caller can observe goes through the accessors.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    catalog: String,
    schema: String,
    table: String,
    column: String,
    alias: String,
    /// Parameter slot name; empty for result columns.
    field_name: String,
    default_value: Option<String>,
    collation: String,
    engine: String,
    auto_index: Option<u64>,
    native_name: String,
    native_id: u32,
    portable: PortableType,
    portable_name: &'static str,
    length: u32,
    precision: u32,
    scale: u32,
    precision_adjust: i32,
    flags: FieldFlags,
    mode: ParamMode,
}

impl FieldDescriptor {
    pub(crate) fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            catalog: String::new(),
            schema: String::new(),
            table: String::new(),
            column: String::new(),
            alias: String::new(),
            field_name: String::new(),
            default_value: None,
            collation: String::new(),
            engine: String::new(),
            auto_index: None,
            native_name: String::new(),
            native_id: 0,
            portable: DEFAULT_PORTABLE,
            portable_name: DEFAULT_PORTABLE_NAME,
            length: 0,
            precision: 0,
            scale: 0,
            precision_adjust: 0,
            flags: FieldFlags::empty(),
            mode: ParamMode::In,
        }
    }

    pub(crate) fn set_location(&mut self, catalog: &str, schema: &str, table: &str) {
        self.catalog = catalog.to_owned();
        self.schema = schema.to_owned();
        self.table = table.to_owned();
    }

    pub(crate) fn set_names(&mut self, column: &str, alias: &str) {
        self.column = column.to_owned();
        self.alias = alias.to_owned();
    }

    pub(crate) fn set_field_name(&mut self, name: &str) {
        self.field_name = name.to_owned();
    }

    pub(crate) fn set_type(&mut self, resolved: &ResolvedType) {
        self.native_name = resolved.native_name.clone();
        self.native_id = resolved.native_id;
        self.portable = resolved.portable;
        self.portable_name = resolved.portable_name;
        self.precision = resolved.precision;
        self.scale = resolved.scale;
        self.precision_adjust = resolved.precision_adjust;
        if resolved.unsigned {
            self.flags |= FieldFlags::UNSIGNED;
        }
        // length tracks the declared width unless a strategy reports better
        if self.length == 0 {
            self.length = resolved.precision;
        }
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    /// Override the declared precision/scale with what the catalog
    /// reports; the adjustment factor stays as resolved.
    pub(crate) fn set_precision_scale(&mut self, precision: u32, scale: u32) {
        self.precision = precision;
        self.scale = scale;
    }

    pub(crate) fn set_default(&mut self, default: Option<String>) {
        self.default_value = default;
    }

    pub(crate) fn set_collation(&mut self, collation: &str) {
        self.collation = collation.to_owned();
    }

    pub(crate) fn set_table_facts(&mut self, engine: &str, auto_index: Option<u64>) {
        self.engine = engine.to_owned();
        self.auto_index = auto_index;
    }

    pub(crate) fn set_flags(&mut self, flags: FieldFlags) {
        self.flags |= flags;
    }

    pub(crate) fn set_mode(&mut self, mode: ParamMode) {
        self.mode = mode;
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The column name, falling back to the alias when the statement only
    /// gave the column an alias.
    pub fn name(&self) -> &str {
        if self.column.is_empty() {
            &self.alias
        } else {
            &self.column
        }
    }

    /// The display alias, falling back to the column name.
    pub fn alias(&self) -> &str {
        if self.alias.is_empty() {
            &self.column
        } else {
            &self.alias
        }
    }

    /// Parameter slot name, empty for result columns.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn collation(&self) -> &str {
        &self.collation
    }

    /// Storage engine, when the strategy that built this descriptor
    /// surfaces table-level facts.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// The table's next auto-increment counter, when known.
    pub fn auto_index(&self) -> Option<u64> {
        self.auto_index
    }

    pub fn native_type_name(&self) -> &str {
        &self.native_name
    }

    pub fn native_type_id(&self) -> u32 {
        self.native_id
    }

    pub fn portable_type(&self) -> PortableType {
        self.portable
    }

    pub fn portable_type_name(&self) -> &str {
        self.portable_name
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Reported precision: the declared precision plus the historical
    /// adjustment factor for the portable type.
    pub fn precision(&self) -> u32 {
        self.precision.saturating_add_signed(self.precision_adjust)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(FieldFlags::NULLABLE)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.flags.contains(FieldFlags::AUTO_INCREMENT)
    }

    pub fn is_primary_key(&self) -> bool {
        self.flags.contains(FieldFlags::PRIMARY_KEY)
    }

    pub fn mode(&self) -> ParamMode {
        self.mode
    }
}
