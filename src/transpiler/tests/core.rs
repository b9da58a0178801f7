//! Core compilation tests: member access, operators, folding, enum coercion.

use rust_decimal::Decimal;

use super::*;
use crate::ast::{BinaryOp, Record, Value};
use crate::error::{CompileError, EvalError};
use crate::transpiler::Clause;

fn freight_gt(value: Expression) -> Expression {
    where_orders(Expression::gt(o("Freight"), value))
}

fn decimal(n: i64) -> Expression {
    Expression::typed_constant(n, HostType::Decimal)
}

#[test]
fn test_member_access_with_bare_entity_alias() {
    assert_eq!(sql(&freight_gt(decimal(0))), "(Orders.Freight > 0)");
}

#[test]
fn test_oracle_quotes_decimal_constants() {
    assert_eq!(oracle_sql(&freight_gt(decimal(0))), "(Orders.Freight > '0')");
}

#[test]
fn test_join_aliases() {
    let employees = HostType::entity("Employees");
    let customers = HostType::entity("Customers");
    let body = Expression::ne(
        member_of("e", employees.clone(), "EmployeeID"),
        member_of("c", customers.clone(), "EmployeeID"),
    );
    let lambda = Expression::lambda([("e", employees), ("c", customers)], body);
    let aliases = AliasMap::new().with("Employees", "").with("Customers", "cust");
    let sql = compile_with(Dialect::Generic, CompileOptions::default(), &lambda, &aliases).unwrap();
    assert_eq!(sql, "(Employees.EmployeeID <> cust.EmployeeID)");
}

#[test]
fn test_unaliased_entity_renders_bare_column() {
    let sql = compile_with(
        Dialect::Generic,
        CompileOptions::default(),
        &freight_gt(decimal(1)),
        &AliasMap::new(),
    )
    .unwrap();
    assert_eq!(sql, "(Freight > 1)");
}

#[test]
fn test_mapped_column_name_is_quoted_when_needed() {
    let expr = where_orders(Expression::eq(o("ShipName"), Expression::constant("Vins")));
    assert_eq!(sql(&expr), "(Orders.\"Ship Name\" = 'Vins')");
}

#[test]
fn test_member_through_convert_uses_operand_type() {
    let target = Expression::convert(Expression::param("o", orders()), HostType::object("IHasId"));
    let member = Expression::member(target, "OrderID", HostType::Int32);
    let expr = where_orders(Expression::eq(member, Expression::constant(7)));
    assert_eq!(sql(&expr), "(Orders.OrderID = 7)");
}

#[test]
fn test_comparison_operators() {
    let ops = [
        (BinaryOp::Equal, "="),
        (BinaryOp::NotEqual, "<>"),
        (BinaryOp::GreaterThan, ">"),
        (BinaryOp::GreaterThanOrEqual, ">="),
        (BinaryOp::LessThan, "<"),
        (BinaryOp::LessThanOrEqual, "<="),
        (BinaryOp::Add, "+"),
        (BinaryOp::Subtract, "-"),
        (BinaryOp::Multiply, "*"),
        (BinaryOp::Divide, "/"),
    ];
    for (op, token) in ops {
        let expr = Expression::binary(op, o("Freight"), decimal(5));
        assert_eq!(sql(&expr), format!("(Orders.Freight {} 5)", token), "{:?}", op);
    }
}

#[test]
fn test_function_style_operators() {
    let modulo = Expression::binary(BinaryOp::Modulo, o("OrderID"), Expression::constant(2));
    assert_eq!(sql(&modulo), "MOD(Orders.OrderID,2)");

    let coalesce =
        Expression::binary(BinaryOp::Coalesce, o("ShipRegion"), Expression::constant("n/a"));
    assert_eq!(sql(&coalesce), "COALESCE(Orders.ShipRegion,'n/a')");
}

#[test]
fn test_unmapped_operator_uses_kind_name() {
    let expr = Expression::binary(BinaryOp::ExclusiveOr, o("OrderID"), Expression::constant(1));
    assert_eq!(sql(&expr), "(Orders.OrderID ExclusiveOr 1)");
}

#[test]
fn test_null_comparison_rewrite() {
    let is_null = where_orders(Expression::eq(o("ShipRegion"), Expression::null()));
    assert_eq!(sql(&is_null), "(Orders.ShipRegion is null)");

    let not_null = where_orders(Expression::ne(o("ShipRegion"), Expression::null()));
    assert_eq!(sql(&not_null), "(Orders.ShipRegion is not null)");
}

#[test]
fn test_null_captured_value_rewrites_too() {
    let closure = Record::new("<>c__DisplayClass0").with("region", Value::Null);
    let region = Expression::member(
        Expression::typed_constant(closure, HostType::object("<>c__DisplayClass0")),
        "region",
        HostType::String,
    );
    let expr = where_orders(Expression::eq(o("ShipRegion"), region));
    assert_eq!(sql(&expr), "(Orders.ShipRegion is NULL)");
}

#[test]
fn test_captured_variable_is_folded() {
    let closure = Record::new("<>c__DisplayClass1").with("limit", Decimal::new(125, 1));
    let limit = Expression::member(
        Expression::typed_constant(closure, HostType::object("<>c__DisplayClass1")),
        "limit",
        HostType::Decimal,
    );
    assert_eq!(sql(&freight_gt(limit.clone())), "(Orders.Freight > 12.5)");
    assert_eq!(oracle_sql(&freight_gt(limit)), "(Orders.Freight > '12.5')");
}

#[test]
fn test_constant_expression_collapses() {
    let expr = where_orders(Expression::eq(
        Expression::binary(BinaryOp::Add, Expression::constant(5), Expression::constant(3)),
        Expression::constant(8),
    ));
    assert_eq!(fragment(&expr).unwrap(), Fragment::Native(Value::Bool(true)));
    assert_eq!(sql(&expr), "true");
}

#[test]
fn test_constant_arithmetic_folds_before_rendering() {
    let twenty = Expression::binary(
        BinaryOp::Multiply,
        Expression::constant(10),
        Expression::constant(2),
    );
    assert_eq!(sql(&freight_gt(twenty)), "(Orders.Freight > 20)");
}

#[test]
fn test_logical_operands_compare_bare_columns_to_true() {
    let expr = where_orders(Expression::and_also(
        Expression::gt(o("Freight"), decimal(5)),
        o("IsShipped"),
    ));
    assert_eq!(sql(&expr), "((Orders.Freight > 5) AND Orders.IsShipped=true)");
    assert_eq!(oracle_sql(&expr), "((Orders.Freight > '5') AND Orders.IsShipped='1')");
}

#[test]
fn test_constant_logical_operand_becomes_canned_predicate() {
    let on = where_orders(Expression::and_also(
        Expression::constant(true),
        Expression::gt(o("Freight"), decimal(5)),
    ));
    assert_eq!(sql(&on), "((true=true) AND (Orders.Freight > 5))");

    let off = where_orders(Expression::or_else(
        Expression::gt(o("Freight"), decimal(5)),
        Expression::constant(false),
    ));
    assert_eq!(sql(&off), "((Orders.Freight > 5) OR (true=false))");
    assert_eq!(oracle_sql(&off), "((Orders.Freight > '5') OR ('1'='0'))");
}

#[test]
fn test_fully_constant_logical_renders_boolean() {
    let expr = where_orders(Expression::or_else(
        Expression::constant(true),
        Expression::constant(false),
    ));
    assert_eq!(fragment(&expr).unwrap(), Fragment::sql("true"));
    assert_eq!(oracle_sql(&expr), "'1'");
}

#[test]
fn test_non_boolean_logical_operand_is_an_error() {
    let expr = where_orders(Expression::and_also(
        Expression::constant(3),
        Expression::gt(o("Freight"), decimal(5)),
    ));
    assert!(matches!(
        fragment(&expr),
        Err(CompileError::Evaluation(EvalError::TypeMismatch(_)))
    ));
}

#[test]
fn test_root_lambda_truthy_shortcut() {
    let expr = where_orders(o("IsShipped"));
    assert_eq!(sql(&expr), "Orders.IsShipped=true");

    let schema = schema();
    let compiler = ExpressionCompiler::new(Dialect::Generic.provider(), &schema);
    let fields = compiler
        .compile_with(&expr, &default_aliases(), Clause::FieldList)
        .unwrap();
    assert_eq!(fields, Fragment::sql("Orders.IsShipped"));
}

#[test]
fn test_not() {
    let bare = where_orders(Expression::not(o("IsShipped")));
    assert_eq!(sql(&bare), "NOT (Orders.IsShipped=true)");

    let comparison = where_orders(Expression::not(Expression::gt(o("Freight"), decimal(5))));
    assert_eq!(sql(&comparison), "NOT ((Orders.Freight > 5))");

    let constant = Expression::not(Expression::constant(true));
    assert_eq!(fragment(&constant).unwrap(), Fragment::Native(Value::Bool(false)));
}

#[test]
fn test_enum_coercion_to_member_name() {
    let expr = where_players(Expression::eq(p("Race"), Expression::constant(2)));
    assert_eq!(sql(&expr), "(Players.Race = 'Dwarf')");

    let reversed = where_players(Expression::eq(Expression::constant(1), p("Race")));
    assert_eq!(sql(&reversed), "('Elf' = Players.Race)");
}

#[test]
fn test_enum_coercion_through_convert() {
    let race = Expression::convert(p("Race"), HostType::Int32);
    let expr = where_players(Expression::eq(race, Expression::constant(3)));
    assert_eq!(sql(&expr), "(Players.Race = 'Human')");
}

#[test]
fn test_enum_coercion_edge_cases() {
    let unknown = where_players(Expression::eq(p("Race"), Expression::constant(9)));
    assert_eq!(sql(&unknown), "(Players.Race = '9')");

    let by_name = where_players(Expression::eq(p("Race"), Expression::constant("Elf")));
    assert_eq!(sql(&by_name), "(Players.Race = 'Elf')");

    let typed = where_players(Expression::eq(p("Race"), Expression::typed_constant(1, race())));
    assert_eq!(sql(&typed), "(Players.Race = 'Elf')");

    let nullable = where_players(Expression::eq(p("FavoriteRace"), Expression::constant(2)));
    assert_eq!(sql(&nullable), "(Players.FavoriteRace = 'Dwarf')");
}

#[test]
fn test_no_enum_coercion_between_columns_or_against_null() {
    let columns = where_players(Expression::eq(p("Race"), p("FavoriteRace")));
    assert_eq!(sql(&columns), "(Players.Race = Players.FavoriteRace)");

    let null = where_players(Expression::eq(p("FavoriteRace"), Expression::null()));
    assert_eq!(sql(&null), "(Players.FavoriteRace is null)");
}

#[test]
fn test_parameter_renders_its_name() {
    let param = Expression::param("o", orders());
    assert_eq!(fragment(&param).unwrap(), Fragment::sql("o"));
}

#[test]
fn test_nested_property_chain_is_an_evaluation_error() {
    let customer = Expression::member(
        Expression::param("o", orders()),
        "Customer",
        HostType::entity("Customers"),
    );
    let name = Expression::member(customer, "CompanyName", HostType::String);
    let expr = where_orders(Expression::eq(name, Expression::constant("Alfreds")));
    assert!(matches!(
        fragment(&expr),
        Err(CompileError::Evaluation(EvalError::InvalidOperation(_)))
    ));
}

#[test]
fn test_depth_guard() {
    let mut expr = o("IsShipped");
    for _ in 0..64 {
        expr = Expression::not(expr);
    }
    let options = CompileOptions {
        max_depth: 16,
        ..CompileOptions::default()
    };
    let result = compile_with(Dialect::Generic, options, &where_orders(expr), &default_aliases());
    assert!(matches!(result, Err(CompileError::DepthExceeded { limit: 16 })));
}

#[test]
fn test_depth_guard_covers_folded_subtrees() {
    let mut deep = Expression::constant(1);
    for _ in 0..64 {
        deep = Expression::negate(deep);
    }
    let schema = schema();
    let compiler = ExpressionCompiler::new(Dialect::Generic.provider(), &schema).with_options(
        CompileOptions {
            max_depth: 16,
            ..CompileOptions::default()
        },
    );
    assert!(matches!(
        compiler.fold(&deep),
        Err(CompileError::DepthExceeded { limit: 16 })
    ));
}

#[test]
fn test_projection_falls_back_to_field_list() {
    let projection = Expression::new_object(
        HostType::object("<>f__AnonymousType0"),
        ["OrderID", "Freight"],
        vec![o("OrderID"), o("Freight")],
    );
    let schema = schema();
    let compiler = ExpressionCompiler::new(Dialect::Generic.provider(), &schema);
    let sql = compiler
        .compile_field_list(&where_orders(projection), &default_aliases())
        .unwrap();
    assert_eq!(sql, "Orders.OrderID,Orders.Freight");

    let array = Expression::new_array(HostType::Int32, vec![o("OrderID"), Expression::constant(5)]);
    assert_eq!(sql_fields(&array), "Orders.OrderID,5");
}

fn sql_fields(expr: &Expression) -> String {
    let schema = schema();
    ExpressionCompiler::new(Dialect::Generic.provider(), &schema)
        .compile_field_list(expr, &default_aliases())
        .unwrap()
}

#[test]
fn test_member_init_projection() {
    let init = Expression::member_init(
        HostType::object("OrderSummary"),
        [("Id", o("OrderID")), ("Region", o("ShipRegion"))],
    );
    assert_eq!(sql_fields(&init), "Orders.OrderID,Orders.ShipRegion");
}

#[test]
fn test_constructed_constant_is_folded() {
    let date = Expression::new_object(
        HostType::DateTime,
        Vec::<String>::new(),
        vec![Expression::constant(1997), Expression::constant(7), Expression::constant(4)],
    );
    let expr = where_orders(Expression::gt(o("OrderDate"), date));
    assert_eq!(sql(&expr), "(Orders.OrderDate > '1997-07-04 00:00:00')");
    assert_eq!(
        oracle_sql(&expr),
        "(Orders.OrderDate > TO_TIMESTAMP('1997-07-04', 'YYYY-MM-DD'))"
    );
}

#[test]
fn test_construction_failure_other_than_invalid_operation_propagates() {
    let bad_date = Expression::new_object(
        HostType::DateTime,
        Vec::<String>::new(),
        vec![Expression::constant(1997), Expression::constant(13), Expression::constant(1)],
    );
    let expr = where_orders(Expression::gt(o("OrderDate"), bad_date));
    assert!(matches!(
        fragment(&expr),
        Err(CompileError::Evaluation(EvalError::InvalidArgument(_)))
    ));
}

#[test]
fn test_attached_conversion_is_evaluated() {
    let converted =
        Expression::convert_with(Expression::constant(3), HostType::Decimal, "op_Implicit");
    assert_eq!(sql(&freight_gt(converted)), "(Orders.Freight > 3)");
}
