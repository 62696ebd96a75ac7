//! Built-in type names and descriptor punctuation

/// Separator between a raw type and its argument segment
pub const HORIZONTAL_LINE: char = '-';

/// Separator between type arguments
pub const COMMA: char = ',';

/// Type name used for a map key or value that is null
pub const DEFAULT_TYPE_NAME: &str = STRING;

pub const NULL: &str = "null";
pub const STRING: &str = "String";
pub const INTEGER: &str = "Integer";
pub const FLOAT: &str = "Float";
pub const BOOLEAN: &str = "Boolean";

pub const LIST: &str = "List";
pub const LINKED_LIST: &str = "LinkedList";
pub const SET: &str = "Set";
pub const MAP: &str = "Map";
pub const MAP_VALUES: &str = "MapValues";
pub const OPTIONAL: &str = "Optional";
pub const ARRAY: &str = "Array";
pub const TYPE: &str = "Type";

/// Root object type; an actual-type override naming it is ignored
pub const OBJECT: &str = "Object";

/// Default asynchronous completion handle
pub const FUTURE: &str = "Future";

/// Base type every generated protocol-buffer message extends
pub const PROTOBUF_MESSAGE: &str = "GeneratedMessage";

/// Package that marks protocol-buffer base types
pub const PROTOBUF_PACKAGE: &str = "google.protobuf";
