//! Expression compiler test modules.
//!
//! Tests are organized by category:
//! - `core`: Member access, operators, null rewriting, enum coercion, constant folding
//! - `methods`: Column text functions, `IN` containment, `Sql.*` helpers, host calls
//! - `dialects`: Literal rendering and quoting per SQL dialect

mod core;

use crate::alias::AliasMap;
use crate::ast::{EnumType, Expression, HostType};
use crate::error::CompileResult;
use crate::schema::SchemaRegistry;
use crate::transpiler::{CompileOptions, Dialect, ExpressionCompiler, Fragment};

pub(super) fn race() -> HostType {
    HostType::enumeration(
        EnumType::new("Race")
            .member("Elf", 1)
            .member("Dwarf", 2)
            .member("Human", 3),
    )
}

/// Northwind-style fixture schema.
pub(super) fn schema() -> SchemaRegistry {
    let mut schema = SchemaRegistry::new();
    schema
        .entity("Orders")
        .field("OrderID", HostType::Int32)
        .field("CustomerID", HostType::String)
        .field("EmployeeID", HostType::Int32)
        .field("Freight", HostType::Decimal)
        .field("ShipRegion", HostType::String)
        .column("ShipName", "Ship Name", HostType::String)
        .field("OrderDate", HostType::DateTime)
        .field("IsShipped", HostType::Bool)
        .field("RowGuid", HostType::Guid);
    schema
        .entity("Employees")
        .field("EmployeeID", HostType::Int32)
        .field("LastName", HostType::String);
    schema
        .entity("Customers")
        .field("CustomerID", HostType::String)
        .field("EmployeeID", HostType::Int32);
    schema
        .entity("Players")
        .field("Name", HostType::String)
        .field("Race", race())
        .field("FavoriteRace", HostType::nullable(race()))
        .field("Level", HostType::Int32)
        .field("IsActive", HostType::Bool);
    schema
}

pub(super) fn orders() -> HostType {
    HostType::entity("Orders")
}

pub(super) fn players() -> HostType {
    HostType::entity("Players")
}

/// Member `name` of the `o: Orders` parameter, typed from the fixture schema.
pub(super) fn o(name: &str) -> Expression {
    member_of("o", orders(), name)
}

/// Member `name` of the `p: Players` parameter.
pub(super) fn p(name: &str) -> Expression {
    member_of("p", players(), name)
}

pub(super) fn member_of(param: &str, entity: HostType, name: &str) -> Expression {
    use crate::schema::TypeSchema;
    let schema = schema();
    let entity_name = entity.entity_name().unwrap_or_default().to_string();
    let ty = schema
        .field(&entity_name, name)
        .map(|f| f.member_type.clone())
        .unwrap_or(HostType::Null);
    Expression::member(Expression::param(param, entity), name, ty)
}

pub(super) fn where_orders(body: Expression) -> Expression {
    Expression::lambda([("o", orders())], body)
}

pub(super) fn where_players(body: Expression) -> Expression {
    Expression::lambda([("p", players())], body)
}

pub(super) fn default_aliases() -> AliasMap {
    AliasMap::new()
        .with("Orders", "")
        .with("Players", "")
        .with("Employees", "")
}

pub(super) fn compile_with(
    dialect: Dialect,
    options: CompileOptions,
    expr: &Expression,
    aliases: &AliasMap,
) -> CompileResult<String> {
    let schema = schema();
    ExpressionCompiler::new(dialect.provider(), &schema)
        .with_options(options)
        .compile_to_sql(expr, aliases)
}

/// Predicate SQL with the generic dialect and the default aliases.
pub(super) fn sql(expr: &Expression) -> String {
    compile_with(Dialect::Generic, CompileOptions::default(), expr, &default_aliases())
        .expect("compile")
}

pub(super) fn oracle_sql(expr: &Expression) -> String {
    compile_with(Dialect::Oracle, CompileOptions::default(), expr, &default_aliases())
        .expect("compile")
}

pub(super) fn fragment(expr: &Expression) -> CompileResult<Fragment> {
    let schema = schema();
    ExpressionCompiler::new(Dialect::Generic.provider(), &schema).compile(expr, &default_aliases())
}
