//! Filter records as the service's protobuf schema defines them.

/// Discriminant of an encoded [`Filter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum FilterType {
    /// Payload is a [`SingleColumnValueFilter`].
    SingleColumnValue = 1,
    /// Payload is a [`CompositeColumnValueFilter`].
    CompositeColumnValue = 2,
}

/// Comparator codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ComparatorType {
    /// `==`
    Equal = 1,
    /// `!=`
    NotEqual = 2,
    /// `>`
    GreaterThan = 3,
    /// `>=`
    GreaterEqual = 4,
    /// `<`
    LessThan = 5,
    /// `<=`
    LessEqual = 6,
}

/// Combinator codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LogicalOperator {
    /// `NOT`
    Not = 1,
    /// `AND`
    And = 2,
    /// `OR`
    Or = 3,
}

/// Tagged, already-encoded filter. Composite filters nest these opaquely.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Filter {
    /// [`FilterType`] of `filter`.
    #[prost(enumeration = "FilterType", required, tag = "1")]
    pub r#type: i32,
    /// Encoded filter record.
    #[prost(bytes = "vec", required, tag = "2")]
    pub filter: Vec<u8>,
}

/// Comparison of one column against an encoded value.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SingleColumnValueFilter {
    /// [`ComparatorType`] code.
    #[prost(enumeration = "ComparatorType", required, tag = "1")]
    pub comparator: i32,
    /// Column to compare.
    #[prost(string, required, tag = "2")]
    pub column_name: String,
    /// PlainBuffer-encoded value (type byte and payload).
    #[prost(bytes = "vec", required, tag = "3")]
    pub column_value: Vec<u8>,
    /// Whether rows lacking the column pass.
    #[prost(bool, required, tag = "4")]
    pub pass_if_missing: bool,
    /// Whether only the newest version is compared.
    #[prost(bool, optional, tag = "5")]
    pub latest_version_only: Option<bool>,
}

/// Logical combination of encoded sub-filters.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CompositeColumnValueFilter {
    /// [`LogicalOperator`] code.
    #[prost(enumeration = "LogicalOperator", required, tag = "1")]
    pub combinator: i32,
    /// Children in order.
    #[prost(message, repeated, tag = "2")]
    pub sub_filters: Vec<Filter>,
}
