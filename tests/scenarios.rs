use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

use sqlexpr::prelude::*;

fn northwind() -> SchemaRegistry {
    let mut schema = SchemaRegistry::new();
    schema
        .entity("Orders")
        .field("OrderID", HostType::Int32)
        .field("CustomerID", HostType::String)
        .field("Freight", HostType::Decimal)
        .field("ShipRegion", HostType::String);
    schema
        .entity("Employees")
        .field("EmployeeID", HostType::Int32);
    schema
        .entity("Customers")
        .field("EmployeeID", HostType::Int32);
    schema
        .entity("Players")
        .field("Name", HostType::String)
        .field("Race", race());
    schema
}

fn race() -> HostType {
    HostType::enumeration(EnumType::new("Race").member("Elf", 1).member("Dwarf", 2))
}

fn orders() -> HostType {
    HostType::entity("Orders")
}

fn order_member(name: &str, ty: HostType) -> Expression {
    Expression::member(Expression::param("o", orders()), name, ty)
}

fn compile(
    dialect: Dialect,
    config: CompilerConfig,
    expr: &Expression,
    aliases: &AliasMap,
) -> String {
    let schema = northwind();
    ExpressionCompiler::new(dialect.provider(), &schema)
        .with_options(config.compile_options())
        .compile_to_sql(expr, aliases)
        .unwrap()
}

#[test]
fn scenario_freight_over_zero_on_oracle() {
    let expr = Expression::lambda(
        [("o", orders())],
        Expression::gt(
            order_member("Freight", HostType::Decimal),
            Expression::typed_constant(0, HostType::Decimal),
        ),
    );
    let aliases = AliasMap::new().with("Orders", "");
    assert_eq!(
        compile(Dialect::Oracle, CompilerConfig::default(), &expr, &aliases),
        "(Orders.Freight > '0')"
    );
}

#[test]
fn scenario_join_with_alias() {
    let employees = HostType::entity("Employees");
    let customers = HostType::entity("Customers");
    let expr = Expression::lambda(
        [("e", employees.clone()), ("c", customers.clone())],
        Expression::ne(
            Expression::member(Expression::param("e", employees), "EmployeeID", HostType::Int32),
            Expression::member(Expression::param("c", customers), "EmployeeID", HostType::Int32),
        ),
    );
    let aliases: AliasMap = [("Employees", ""), ("Customers", "cust")].into_iter().collect();
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &expr, &aliases),
        "(Employees.EmployeeID <> cust.EmployeeID)"
    );
}

#[test]
fn scenario_starts_with() {
    let expr = Expression::lambda(
        [("o", orders())],
        Expression::call(
            order_member("CustomerID", HostType::String),
            "StartsWith",
            vec![Expression::constant("se")],
            HostType::Bool,
        ),
    );
    let aliases = AliasMap::new().with("Orders", "");
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &expr, &aliases),
        "upper(Orders.CustomerID) like 'SE%'"
    );

    let config = CompilerConfig::builder().strip_upper_in_like(true).build().unwrap();
    assert_eq!(
        compile(Dialect::Generic, config, &expr, &aliases),
        "Orders.CustomerID like 'se%'"
    );
}

#[test]
fn enum_comparison_uses_member_name() {
    let players = HostType::entity("Players");
    let expr = Expression::eq(
        Expression::member(Expression::param("p", players), "Race", race()),
        Expression::constant(2),
    );
    let aliases = AliasMap::new().with("Players", "pl");
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &expr, &aliases),
        "(pl.Race = 'Dwarf')"
    );
}

#[test]
fn in_list_and_empty_in_list() {
    let players = HostType::entity("Players");
    let name = Expression::member(Expression::param("p", players), "Name", HostType::String);
    let aliases = AliasMap::new().with("Players", "");
    let contains = |items: Vec<&str>| {
        Expression::call(
            Expression::constant(items),
            "Contains",
            vec![name.clone()],
            HostType::Bool,
        )
    };
    assert_eq!(
        compile(
            Dialect::Generic,
            CompilerConfig::default(),
            &contains(vec!["Elf", "Dwarf"]),
            &aliases
        ),
        "Players.Name In ('Elf','Dwarf')"
    );
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &contains(vec![]), &aliases),
        "Players.Name In (NULL)"
    );
}

#[test]
fn null_comparisons_use_is() {
    let region = order_member("ShipRegion", HostType::String);
    let aliases = AliasMap::new().with("Orders", "");
    let eq = Expression::eq(region.clone(), Expression::null());
    let ne = Expression::ne(region, Expression::null());
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &eq, &aliases),
        "(Orders.ShipRegion is null)"
    );
    assert_eq!(
        compile(Dialect::Generic, CompilerConfig::default(), &ne, &aliases),
        "(Orders.ShipRegion is not null)"
    );
}

#[test]
fn expression_trees_load_from_json() {
    let expr = Expression::lambda(
        [("o", orders())],
        Expression::gt(
            order_member("Freight", HostType::Decimal),
            Expression::typed_constant(10, HostType::Decimal),
        ),
    );
    let json = serde_json::to_string(&expr).unwrap();
    let loaded: Expression = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, expr);

    let schema = SchemaRegistry::from_json(&serde_json::to_string(&northwind()).unwrap()).unwrap();
    let sql = ExpressionCompiler::new(Dialect::Generic.provider(), &schema)
        .compile_to_sql(&loaded, &AliasMap::new().with("Orders", "o"))
        .unwrap();
    assert_eq!(sql, "(o.Freight > 10)");
}

#[test]
fn shared_provider_across_threads() {
    let provider: Arc<dyn SqlDialect> = Dialect::Oracle.provider();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let provider = Arc::clone(&provider);
            thread::spawn(move || {
                let schema = northwind();
                let expr = Expression::eq(
                    order_member("OrderID", HostType::Int32),
                    Expression::constant(i),
                );
                ExpressionCompiler::new(provider, &schema)
                    .compile_to_sql(&expr, &AliasMap::new().with("Orders", ""))
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![
            "(Orders.OrderID = 0)",
            "(Orders.OrderID = 1)",
            "(Orders.OrderID = 2)",
            "(Orders.OrderID = 3)",
        ]
    );
}

#[test]
fn unsupported_column_method_is_reported() {
    let expr = Expression::call(
        order_member("CustomerID", HostType::String),
        "Normalize",
        vec![],
        HostType::String,
    );
    let schema = northwind();
    let err = ExpressionCompiler::new(Dialect::Generic.provider(), &schema)
        .compile(&expr, &AliasMap::new().with("Orders", ""))
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported operation: 'Normalize' on Orders.CustomerID");
}

#[test]
fn convenience_entry_point_uses_config() {
    let expr = Expression::gt(
        order_member("Freight", HostType::Decimal),
        Expression::typed_constant(3, HostType::Decimal),
    );
    let config = CompilerConfig::builder().dialect(Dialect::SqlServer).build().unwrap();
    let aliases = AliasMap::new().with("Orders", "");
    let sql = sqlexpr::compile_to_sql(&expr, &aliases, &northwind(), &config).unwrap();
    assert_eq!(sql, "([Orders].[Freight] > 3)");
}
